//! SPICE Netlist Parser
//!
//! Turns line-oriented SPICE-like text into structured component records.
//! Parsing is total: a line that cannot be understood becomes an
//! [`ComponentKind::Unknown`] record carrying the original text, and a
//! component with too few nodes is kept and flagged `incomplete`, so every
//! input yields a renderable [`Netlist`].

use crate::parser::value::{format_value, parse_value, UnitKind, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Kind of circuit element, selected from the first token of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Resistor,
    Capacitor,
    Inductor,
    VoltageSource,
    CurrentSource,
    Diode,
    Ground,
    Wire,
    Bjt,
    Mosfet,
    Switch,
    Unknown,
}

/// Whole-token keywords, matched case-insensitively before the prefix table.
const KEYWORDS: &[(&str, ComponentKind)] = &[
    ("GND", ComponentKind::Ground),
    ("0", ComponentKind::Ground),
    ("WIRE", ComponentKind::Wire),
];

/// Leading-character table.
const PREFIXES: &[(char, ComponentKind)] = &[
    ('R', ComponentKind::Resistor),
    ('C', ComponentKind::Capacitor),
    ('L', ComponentKind::Inductor),
    ('V', ComponentKind::VoltageSource),
    ('I', ComponentKind::CurrentSource),
    ('D', ComponentKind::Diode),
    ('W', ComponentKind::Wire),
    ('Q', ComponentKind::Bjt),
    ('M', ComponentKind::Mosfet),
    ('S', ComponentKind::Switch),
];

/// Source-specification keywords that are never node names.
const SOURCE_KEYWORDS: &[&str] = &["DC", "AC", "SIN", "PULSE", "PWL", "EXP", "SFFM"];

impl ComponentKind {
    pub const ALL: [ComponentKind; 12] = [
        ComponentKind::Resistor,
        ComponentKind::Capacitor,
        ComponentKind::Inductor,
        ComponentKind::VoltageSource,
        ComponentKind::CurrentSource,
        ComponentKind::Diode,
        ComponentKind::Ground,
        ComponentKind::Wire,
        ComponentKind::Bjt,
        ComponentKind::Mosfet,
        ComponentKind::Switch,
        ComponentKind::Unknown,
    ];

    /// Resolve the kind of a line from its first token.
    pub fn from_token(token: &str) -> Self {
        if let Some((_, kind)) = KEYWORDS
            .iter()
            .find(|(keyword, _)| keyword.eq_ignore_ascii_case(token))
        {
            return *kind;
        }
        let Some(first) = token.chars().next() else {
            return ComponentKind::Unknown;
        };
        let first = first.to_ascii_uppercase();
        PREFIXES
            .iter()
            .find(|(prefix, _)| *prefix == first)
            .map(|(_, kind)| *kind)
            .unwrap_or(ComponentKind::Unknown)
    }

    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            ComponentKind::Resistor => "Resistor",
            ComponentKind::Capacitor => "Capacitor",
            ComponentKind::Inductor => "Inductor",
            ComponentKind::VoltageSource => "Voltage Source",
            ComponentKind::CurrentSource => "Current Source",
            ComponentKind::Diode => "Diode",
            ComponentKind::Ground => "Ground",
            ComponentKind::Wire => "Wire",
            ComponentKind::Bjt => "Transistor (BJT)",
            ComponentKind::Mosfet => "MOSFET",
            ComponentKind::Switch => "Switch",
            ComponentKind::Unknown => "Unknown",
        }
    }

    /// Leading token that selects this kind, for listings
    pub fn prefix(&self) -> &'static str {
        match self {
            ComponentKind::Resistor => "R",
            ComponentKind::Capacitor => "C",
            ComponentKind::Inductor => "L",
            ComponentKind::VoltageSource => "V",
            ComponentKind::CurrentSource => "I",
            ComponentKind::Diode => "D",
            ComponentKind::Ground => "GND / 0",
            ComponentKind::Wire => "W / WIRE",
            ComponentKind::Bjt => "Q",
            ComponentKind::Mosfet => "M",
            ComponentKind::Switch => "S",
            ComponentKind::Unknown => "*",
        }
    }

    /// Number of nodes the kind normally connects
    pub fn terminal_count(&self) -> usize {
        match self {
            ComponentKind::Ground => 1,
            ComponentKind::Bjt | ComponentKind::Mosfet => 3,
            _ => 2,
        }
    }

    /// Largest number of node tokens consumed from a line
    pub fn max_terminals(&self) -> usize {
        match self {
            // Optional bulk terminal.
            ComponentKind::Mosfet => 4,
            // Subcircuit calls list every pin before the subcircuit name.
            ComponentKind::Unknown => usize::MAX,
            other => other.terminal_count(),
        }
    }

    /// Whether the kind carries a numeric value (as opposed to a model name)
    pub fn takes_value(&self) -> bool {
        matches!(
            self,
            ComponentKind::Resistor
                | ComponentKind::Capacitor
                | ComponentKind::Inductor
                | ComponentKind::VoltageSource
                | ComponentKind::CurrentSource
        )
    }

    pub fn takes_model(&self) -> bool {
        matches!(
            self,
            ComponentKind::Diode | ComponentKind::Bjt | ComponentKind::Mosfet | ComponentKind::Switch
        )
    }

    pub fn is_source(&self) -> bool {
        matches!(self, ComponentKind::VoltageSource | ComponentKind::CurrentSource)
    }

    /// Unit assumed when a value token carries none
    pub fn default_unit(&self) -> UnitKind {
        match self {
            ComponentKind::Resistor => UnitKind::Ohm,
            ComponentKind::Capacitor => UnitKind::Farad,
            ComponentKind::Inductor => UnitKind::Henry,
            ComponentKind::VoltageSource => UnitKind::Volt,
            ComponentKind::CurrentSource => UnitKind::Ampere,
            _ => UnitKind::Unitless,
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opaque identifier of an electrical connection point.
///
/// Ground aliases (`0`, `gnd`, `GND`) collapse to `0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

const GROUND_NODE: &str = "0";
const FLOATING_PREFIX: &str = "~L";

impl NodeId {
    pub fn new(token: &str) -> Self {
        if token == GROUND_NODE || token.eq_ignore_ascii_case("gnd") {
            Self::ground()
        } else {
            NodeId(token.to_string())
        }
    }

    pub fn ground() -> Self {
        NodeId(GROUND_NODE.to_string())
    }

    /// Node for a record whose line had no node token. Unique per line, so it
    /// never joins two records.
    pub fn floating(line: usize) -> Self {
        NodeId(format!("{}{}", FLOATING_PREFIX, line))
    }

    pub fn is_ground(&self) -> bool {
        self.0 == GROUND_NODE
    }

    pub fn is_floating(&self) -> bool {
        self.0.starts_with(FLOATING_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One circuit element parsed from one line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub kind: ComponentKind,
    /// Reference designator as written, e.g. `R1`
    pub reference: String,
    /// Connected nodes in terminal order; never empty
    pub nodes: Vec<NodeId>,
    pub value: Value,
    /// Raw value token, kept when it did not parse
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_text: Option<String>,
    /// Device model name, e.g. `D1N4148`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Tokens after the value/model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,
    pub raw_line: String,
    /// 1-based line number in the parsed text
    pub line: usize,
    /// Fewer nodes than the kind requires
    pub incomplete: bool,
}

impl ComponentRecord {
    /// Nodes that are real connection points (not synthetic floating nodes)
    pub fn connected_nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().filter(|n| !n.is_floating())
    }

    pub fn has_node(&self, node: &NodeId) -> bool {
        self.nodes.iter().any(|n| n == node)
    }

    /// Label text for the value or model, `None` when neither is known
    pub fn value_label(&self) -> Option<String> {
        match (&self.value, &self.model) {
            (Value::Known { .. }, _) => Some(format_value(&self.value)),
            (Value::Unspecified, Some(model)) => Some(model.clone()),
            (Value::Unspecified, None) => self.value_text.clone(),
        }
    }
}

/// A parsed netlist. Immutable once produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Netlist {
    pub components: Vec<ComponentRecord>,
    /// Distinct connection points, excluding synthetic floating nodes
    pub nodes: BTreeSet<NodeId>,
    /// Dot-command lines (`.end`, `.tran ...`)
    pub directives: Vec<String>,
}

impl Netlist {
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn has_ground(&self) -> bool {
        self.nodes.iter().any(NodeId::is_ground)
    }

    pub fn has_source(&self) -> bool {
        self.components.iter().any(|c| c.kind.is_source())
    }

    /// Records touching `node`, in netlist order
    pub fn components_on<'a>(
        &'a self,
        node: &'a NodeId,
    ) -> impl Iterator<Item = &'a ComponentRecord> + 'a {
        self.components.iter().filter(move |c| c.has_node(node))
    }

    pub fn count_of(&self, kind: ComponentKind) -> usize {
        self.components.iter().filter(|c| c.kind == kind).count()
    }
}

/// Parse SPICE-like text into a [`Netlist`]. Never fails.
pub fn parse(raw_text: &str) -> Netlist {
    let mut netlist = Netlist::default();

    for (index, line) in raw_text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_comment(trimmed) {
            continue;
        }
        if trimmed.starts_with('.') {
            netlist.directives.push(trimmed.to_string());
            continue;
        }

        let record = parse_line(trimmed, index + 1);
        if record.kind == ComponentKind::Unknown {
            tracing::debug!("Unrecognized netlist line {}: {}", record.line, record.raw_line);
        } else if record.incomplete {
            tracing::debug!(
                "{} on line {} has {} of {} nodes",
                record.reference,
                record.line,
                record.connected_nodes().count(),
                record.kind.terminal_count()
            );
        }

        netlist
            .nodes
            .extend(record.connected_nodes().cloned());
        netlist.components.push(record);
    }

    netlist
}

fn is_comment(line: &str) -> bool {
    line.starts_with('*') || line.starts_with(';') || line.starts_with('#') || line.starts_with("//")
}

fn parse_line(line: &str, line_number: usize) -> ComponentRecord {
    let mut tokens = line.split_whitespace();
    let reference = tokens.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = tokens.collect();
    let kind = ComponentKind::from_token(&reference);

    let mut nodes = Vec::new();
    let mut cursor = 0;
    while cursor < rest.len() && nodes.len() < kind.max_terminals() {
        let token = rest[cursor];
        if !looks_like_node(token) {
            break;
        }
        // Optional terminals are only taken when something follows them.
        if nodes.len() >= kind.terminal_count() && cursor + 1 >= rest.len() {
            break;
        }
        nodes.push(NodeId::new(token));
        cursor += 1;
    }
    let tail = &rest[cursor..];

    let mut value = Value::Unspecified;
    let mut value_text = None;
    let mut model = None;
    let mut params: Vec<String> = Vec::new();

    if kind.takes_value() {
        let skip = usize::from(tail.first().map_or(false, |t| t.eq_ignore_ascii_case("DC")));
        if let Some(token) = tail.get(skip) {
            value = parse_value(token, kind.default_unit());
            value_text = Some(token.to_string());
            params.extend(tail[skip + 1..].iter().map(|t| t.to_string()));
        }
    } else if kind.takes_model() {
        if let Some(token) = tail.first() {
            match parse_value(token, kind.default_unit()) {
                Value::Known { .. } => value_text = Some(token.to_string()),
                Value::Unspecified => model = Some(token.to_string()),
            }
            params.extend(tail[1..].iter().map(|t| t.to_string()));
        }
    } else {
        params.extend(tail.iter().map(|t| t.to_string()));
    }

    // A bare ground marker attaches to node 0.
    if nodes.is_empty() && kind == ComponentKind::Ground {
        nodes.push(NodeId::ground());
    }

    let incomplete = kind != ComponentKind::Unknown && nodes.len() < kind.terminal_count();

    if nodes.is_empty() {
        nodes.push(NodeId::floating(line_number));
    }

    ComponentRecord {
        kind,
        reference,
        nodes,
        value,
        value_text,
        model,
        params,
        raw_line: line.to_string(),
        line: line_number,
        incomplete,
    }
}

/// Node names are integers or identifiers (`in`, `n1`, `vdd`, `net_3`).
pub(crate) fn looks_like_node(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if SOURCE_KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(token)) {
        return false;
    }
    if !token.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == '+') {
        return false;
    }
    if first.is_ascii_digit() {
        return token.chars().all(|c| c.is_ascii_digit());
    }
    first.is_alphabetic() || first == '_'
}
