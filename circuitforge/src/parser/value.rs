//! Component value parsing
//!
//! Turns SPICE value tokens such as `1k`, `4.7uF`, `1kΩ`, `10mH`, `4k7` or
//! `2meg` into a canonical magnitude plus unit. Anything that does not parse
//! degrades to [`Value::Unspecified`] instead of failing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical unit attached to a component value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Ohm,
    Farad,
    Henry,
    Volt,
    Ampere,
    Unitless,
}

impl UnitKind {
    /// Symbol used when formatting values for labels
    pub fn symbol(&self) -> &'static str {
        match self {
            UnitKind::Ohm => "Ω",
            UnitKind::Farad => "F",
            UnitKind::Henry => "H",
            UnitKind::Volt => "V",
            UnitKind::Ampere => "A",
            UnitKind::Unitless => "",
        }
    }
}

/// A parsed component value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Value {
    Known { magnitude: f64, unit: UnitKind },
    Unspecified,
}

impl Value {
    pub fn known(magnitude: f64, unit: UnitKind) -> Self {
        Value::Known { magnitude, unit }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Value::Known { .. })
    }

    pub fn magnitude(&self) -> Option<f64> {
        match self {
            Value::Known { magnitude, .. } => Some(*magnitude),
            Value::Unspecified => None,
        }
    }

    pub fn unit(&self) -> Option<UnitKind> {
        match self {
            Value::Known { unit, .. } => Some(*unit),
            Value::Unspecified => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Unspecified
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_value(self))
    }
}

/// Engineering multipliers, longest spellings first so `meg` wins over `m`.
const MULTIPLIERS: &[(&str, f64)] = &[
    ("meg", 1e6),
    ("MEG", 1e6),
    ("Meg", 1e6),
    ("T", 1e12),
    ("G", 1e9),
    ("g", 1e9),
    ("M", 1e6),
    ("k", 1e3),
    ("K", 1e3),
    ("m", 1e-3),
    ("u", 1e-6),
    ("U", 1e-6),
    ("µ", 1e-6),
    ("μ", 1e-6),
    ("n", 1e-9),
    ("N", 1e-9),
    ("p", 1e-12),
    ("P", 1e-12),
    ("f", 1e-15),
];

/// Prefixes used when formatting, largest first.
const FORMAT_PREFIXES: &[(f64, &str)] = &[
    (1e12, "T"),
    (1e9, "G"),
    (1e6, "M"),
    (1e3, "k"),
    (1.0, ""),
    (1e-3, "m"),
    (1e-6, "µ"),
    (1e-9, "n"),
    (1e-12, "p"),
    (1e-15, "f"),
];

/// Parse a value token. A token without a unit word takes `default_unit`.
pub fn parse_value(token: &str, default_unit: UnitKind) -> Value {
    let token = token.trim().trim_end_matches(|c: char| c == ',' || c == ';');
    let Some((number, rest)) = split_number(token) else {
        return Value::Unspecified;
    };

    let (multiplier, after_prefix) = split_multiplier(rest);
    let prefixed = after_prefix.len() < rest.len();
    let rest = after_prefix;

    // RKM notation: the multiplier doubles as the decimal point ("4k7", "2R2").
    let (number, rest) = match rkm_fraction(rest) {
        Some((fraction, remaining)) if !token.contains('.') => (number + fraction, remaining),
        _ => (number, rest),
    };

    let unit = if rest.is_empty() {
        default_unit
    } else {
        match unit_word(rest) {
            Some(unit) => unit,
            // After a prefix a lone "f" is the farad unit ("100nf").
            None if prefixed && rest == "f" => UnitKind::Farad,
            None => return Value::Unspecified,
        }
    };

    let magnitude = number * multiplier;
    if !magnitude.is_finite() {
        return Value::Unspecified;
    }
    Value::known(magnitude, unit)
}

/// Format a value in engineering notation, e.g. `4.7kΩ`, `10µF`, `9V`.
pub fn format_value(value: &Value) -> String {
    match value {
        Value::Unspecified => "?".to_string(),
        Value::Known { magnitude, unit } => format_magnitude(*magnitude, unit.symbol()),
    }
}

fn format_magnitude(magnitude: f64, symbol: &str) -> String {
    if magnitude == 0.0 {
        return format!("0{}", symbol);
    }
    let abs = magnitude.abs();
    let (scale, prefix) = FORMAT_PREFIXES
        .iter()
        .copied()
        .find(|(scale, _)| abs >= *scale * 0.9995)
        .unwrap_or((1e-15, "f"));

    let scaled = format!("{:.3}", magnitude / scale);
    let scaled = scaled.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}{}", scaled, prefix, symbol)
}

/// Split the leading decimal number (with optional sign and exponent) off a token.
fn split_number(token: &str) -> Option<(f64, &str)> {
    let bytes = token.as_bytes();
    let mut end = 0;

    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    if end == digits_start || &token[digits_start..end] == "." {
        return None;
    }

    // Exponent only when followed by digits, so "1e3" parses but "1E" does not eat a unit.
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    let number = token[..end].parse::<f64>().ok()?;
    Some((number, &token[end..]))
}

fn split_multiplier(rest: &str) -> (f64, &str) {
    if rest.is_empty() {
        return (1.0, rest);
    }
    // A bare unit word ("F", "V", "ohm") has no multiplier. A lone lowercase
    // "f" is femto, as in SPICE.
    if rest != "f" && unit_word(rest).is_some() {
        return (1.0, rest);
    }
    for (prefix, multiplier) in MULTIPLIERS {
        if let Some(remaining) = rest.strip_prefix(prefix) {
            return (*multiplier, remaining);
        }
    }
    // "4R7" style: R is a decimal marker with no scaling.
    if let Some(remaining) = rest.strip_prefix(|c: char| c == 'R' || c == 'r') {
        if remaining.starts_with(|c: char| c.is_ascii_digit()) {
            return (1.0, remaining);
        }
    }
    (1.0, rest)
}

fn rkm_fraction(rest: &str) -> Option<(f64, &str)> {
    let digits_end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let fraction = format!("0.{}", &rest[..digits_end]).parse::<f64>().ok()?;
    Some((fraction, &rest[digits_end..]))
}

fn unit_word(word: &str) -> Option<UnitKind> {
    match word {
        "Ω" | "ω" => return Some(UnitKind::Ohm),
        "F" => return Some(UnitKind::Farad),
        _ => {}
    }
    match word.to_ascii_lowercase().as_str() {
        "ohm" | "ohms" | "r" => Some(UnitKind::Ohm),
        "farad" | "farads" => Some(UnitKind::Farad),
        "h" | "henry" | "henries" | "henrys" => Some(UnitKind::Henry),
        "v" | "volt" | "volts" | "vdc" | "vac" => Some(UnitKind::Volt),
        "a" | "amp" | "amps" | "ampere" | "amperes" => Some(UnitKind::Ampere),
        _ => None,
    }
}
