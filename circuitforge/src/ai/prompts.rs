//! Prompt preparation.
//!
//! The seq2seq model was trained on one sentence shape:
//! `A series circuit with 5V source, a 100 resistor and a 10uF capacitor.`
//! [`normalize_prompt`] rewrites looser descriptions into that shape.

const DEFAULT_SOURCE_VOLTS: &str = "12";

/// Words that carry no component information
const IGNORED_WORDS: &[&str] = &[
    "battery",
    "source",
    "generator",
    "connected",
    "with",
    "to",
    "and",
    "in",
    "series",
    "circuit",
    "a",
    "an",
    "the",
];

/// Substrings naming a component type, longest first so `cap` wins over `c`.
const TYPE_ROOTS: &[(&str, PartType)] = &[
    ("capacitor", PartType::Capacitor),
    ("resistor", PartType::Resistor),
    ("inductor", PartType::Inductor),
    ("diode", PartType::Diode),
    ("coil", PartType::Inductor),
    ("led", PartType::Diode),
    ("ohm", PartType::Resistor),
    ("res", PartType::Resistor),
    ("cap", PartType::Capacitor),
    ("ind", PartType::Inductor),
    ("r", PartType::Resistor),
    ("l", PartType::Inductor),
    ("c", PartType::Capacitor),
    ("d", PartType::Diode),
    ("h", PartType::Inductor),
    ("f", PartType::Capacitor),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartType {
    Resistor,
    Capacitor,
    Inductor,
    Diode,
}

impl PartType {
    fn noun(&self) -> &'static str {
        match self {
            PartType::Resistor => "resistor",
            PartType::Capacitor => "capacitor",
            PartType::Inductor => "inductor",
            PartType::Diode => "diode",
        }
    }
}

/// A token such as `10`, `4.7k`, `10uf`, `2mh` or `100ohm`
#[derive(Debug, PartialEq)]
struct ValueToken<'a> {
    number: &'a str,
    prefix: &'a str,
    suffix: Option<PartType>,
}

/// Rewrite a free-form description into the canonical training sentence.
///
/// Returns `None` when no component can be recognized; callers then send
/// the original text unchanged.
pub fn normalize_prompt(input: &str) -> Option<String> {
    let mut text = input.to_lowercase().replace(&[',', '-'][..], " ");

    let source = match find_source_voltage(&text) {
        Some((matched, volts)) => {
            let volts = volts.to_string();
            text = text.replace(matched.as_str(), " ");
            volts
        }
        None => DEFAULT_SOURCE_VOLTS.to_string(),
    };

    let mut parts: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;

    for token in text.split_whitespace() {
        let token = token.trim_end_matches('.');
        if token.is_empty() || IGNORED_WORDS.contains(&token) {
            continue;
        }

        if let Some(value) = parse_value_token(token) {
            let amount = format!("{}{}", value.number, value.prefix);
            match value.suffix {
                Some(PartType::Inductor) => parts.push(format!("a {}H inductor", amount)),
                Some(PartType::Capacitor) => parts.push(format!("a {}F capacitor", amount)),
                Some(_) => parts.push(format!("a {} resistor", amount)),
                None if matches!(value.prefix, "u" | "n" | "p") => {
                    parts.push(format!("a {}F capacitor", amount));
                }
                None => {
                    pending = Some(amount);
                    continue;
                }
            }
            pending = None;
        } else if let Some(kind) = find_type(token) {
            if kind == PartType::Diode {
                parts.push("a diode".to_string());
                if let Some(amount) = pending.take() {
                    parts.push(format!("a {} resistor", amount));
                }
            } else if let Some(mut amount) = pending.take() {
                match kind {
                    PartType::Inductor if !amount.ends_with('H') => amount.push('H'),
                    PartType::Capacitor if !amount.ends_with('F') => amount.push('F'),
                    _ => {}
                }
                parts.push(format!("a {} {}", amount, kind.noun()));
            }
        }
    }

    if let Some(amount) = pending {
        parts.push(format!("a {} resistor", amount));
    }

    let listed = match parts.split_last() {
        None => return None,
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} and {}", rest.join(", "), last),
    };
    Some(format!("A series circuit with {}V source, {}.", source, listed))
}

/// Find the first `<number> v` in `text`. Returns the matched span and the number.
fn find_source_voltage(text: &str) -> Option<(String, &str)> {
    let bytes = text.as_bytes();
    for (start, _) in text.char_indices() {
        if !bytes[start].is_ascii_digit() {
            continue;
        }
        let mut end = digits_end(bytes, start);
        if bytes.get(end) == Some(&b'.') && bytes.get(end + 1).is_some_and(u8::is_ascii_digit) {
            end = digits_end(bytes, end + 1);
        }
        let number = &text[start..end];
        let rest = &text[end..];
        let after_space = rest.trim_start();
        if after_space.starts_with('v') {
            let matched_len = end - start + (rest.len() - after_space.len()) + 1;
            return Some((text[start..start + matched_len].to_string(), number));
        }
    }
    None
}

fn digits_end(bytes: &[u8], from: usize) -> usize {
    let mut end = from;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    end
}

fn parse_value_token(token: &str) -> Option<ValueToken<'_>> {
    let bytes = token.as_bytes();
    let mut end = digits_end(bytes, 0);
    if end == 0 {
        return None;
    }
    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_end(bytes, end + 1);
        if frac_end == end + 1 {
            return None;
        }
        end = frac_end;
    }
    let number = &token[..end];

    let prefix_len = token[end..]
        .bytes()
        .take_while(|b| matches!(b, b'm' | b'u' | b'n' | b'p' | b'k'))
        .count();
    let prefix = &token[end..end + prefix_len];

    let suffix = match &token[end + prefix_len..] {
        "" => None,
        "h" => Some(PartType::Inductor),
        "f" => Some(PartType::Capacitor),
        "ohm" => Some(PartType::Resistor),
        _ => return None,
    };
    Some(ValueToken {
        number,
        prefix,
        suffix,
    })
}

fn find_type(token: &str) -> Option<PartType> {
    TYPE_ROOTS
        .iter()
        // Single-letter roots only count inside short tokens.
        .filter(|(root, _)| root.len() > 1 || token.len() <= 3)
        .find(|(root, _)| token.contains(root))
        .map(|(_, kind)| *kind)
}

/// Wrap a description in instructions for a general-purpose local model.
pub fn build_instruction_prompt(description: &str) -> String {
    format!(
        r#"You convert circuit descriptions into SPICE netlists.

Rules:
- One component per line: <reference> <node> <node> <value>
- References start with the component letter (R, C, L, V, I, D, Q, M, S)
- Use node 0 for ground
- Finish with a line containing only .end
- Output the netlist only, no explanation and no markdown

Description: {}

Netlist:"#,
        description.trim()
    )
}
