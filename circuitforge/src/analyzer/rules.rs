use crate::analyzer::graph::CircuitGraph;
use crate::parser::{ComponentKind, ComponentRecord, Netlist, NodeId, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Suggestion,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Suggestion => "suggestion",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub component: Option<String>,
    /// 1-based netlist line of the offending record
    pub line: Option<usize>,
    pub suggestion: Option<String>,
}

impl Issue {
    fn new(rule: &dyn Rule, message: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            rule_id: rule.id().to_string(),
            severity: rule.severity(),
            message,
            component: None,
            line: None,
            suggestion: None,
        }
    }

    fn at(mut self, record: &ComponentRecord) -> Self {
        self.component = Some(record.reference.clone());
        self.line = Some(record.line);
        self
    }

    fn suggest(mut self, suggestion: &str) -> Self {
        self.suggestion = Some(suggestion.to_string());
        self
    }
}

pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn severity(&self) -> Severity;
    fn check(&self, netlist: &Netlist) -> Vec<Issue>;
}

pub struct RulesEngine {
    rules: Vec<Arc<dyn Rule>>,
}

impl RulesEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_default_rules() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Arc::new(NoComponentsRule));
        engine.add_rule(Arc::new(GroundReferenceRule));
        engine.add_rule(Arc::new(PowerSourceRule));
        engine.add_rule(Arc::new(ComponentValueRule));
        engine.add_rule(Arc::new(UnknownComponentRule));
        engine.add_rule(Arc::new(IncompleteComponentRule));
        engine.add_rule(Arc::new(FloatingNodeRule));
        engine.add_rule(Arc::new(ConnectivityRule));
        engine.add_rule(Arc::new(DuplicateReferenceRule));
        engine
    }

    pub fn add_rule(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
    }

    /// Keep only the rules whose id is listed; an empty list keeps all.
    pub fn retain_rules(&mut self, ids: &[String]) {
        if ids.is_empty() {
            return;
        }
        self.rules.retain(|rule| ids.iter().any(|id| id == rule.id()));
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.id()).collect()
    }

    pub fn analyze(&self, netlist: &Netlist) -> Vec<Issue> {
        let mut issues = Vec::new();
        for rule in &self.rules {
            issues.extend(rule.check(netlist));
        }
        tracing::debug!("{} rules produced {} issues", self.rules.len(), issues.len());
        issues
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

// Rule implementations

pub struct NoComponentsRule;

impl Rule for NoComponentsRule {
    fn id(&self) -> &str {
        "no_components"
    }

    fn name(&self) -> &str {
        "Empty Netlist"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, netlist: &Netlist) -> Vec<Issue> {
        if !netlist.is_empty() {
            return Vec::new();
        }
        vec![Issue::new(self, "No components detected in the netlist".to_string())
            .suggest("Describe at least one source and one load, e.g. \"9V battery with a 1k resistor\"")]
    }
}

pub struct GroundReferenceRule;

impl Rule for GroundReferenceRule {
    fn id(&self) -> &str {
        "ground_reference"
    }

    fn name(&self) -> &str {
        "Ground Reference"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, netlist: &Netlist) -> Vec<Issue> {
        if netlist.is_empty() || netlist.has_ground() {
            return Vec::new();
        }
        vec![Issue::new(self, "Circuit has no ground reference (node 0)".to_string())
            .suggest("Connect the negative side of the source to node 0")]
    }
}

pub struct PowerSourceRule;

impl Rule for PowerSourceRule {
    fn id(&self) -> &str {
        "power_source"
    }

    fn name(&self) -> &str {
        "Power Source"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, netlist: &Netlist) -> Vec<Issue> {
        if netlist.is_empty() || netlist.has_source() {
            return Vec::new();
        }
        vec![Issue::new(self, "Circuit has no voltage or current source".to_string())
            .suggest("Add a V or I line, e.g. \"V1 1 0 9V\"")]
    }
}

pub struct ComponentValueRule;

impl Rule for ComponentValueRule {
    fn id(&self) -> &str {
        "component_value"
    }

    fn name(&self) -> &str {
        "Component Value"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, netlist: &Netlist) -> Vec<Issue> {
        netlist
            .components
            .iter()
            .filter(|c| c.kind.takes_value() && c.value == Value::Unspecified)
            .map(|c| {
                let message = match &c.value_text {
                    Some(text) => format!(
                        "{} ({}) has an unreadable value '{}'",
                        c.reference,
                        c.kind.name(),
                        text
                    ),
                    None => format!("{} ({}) has no value", c.reference, c.kind.name()),
                };
                Issue::new(self, message)
                    .at(c)
                    .suggest("Use a number with an optional suffix such as 1k, 4.7u or 10mH")
            })
            .collect()
    }
}

pub struct UnknownComponentRule;

impl Rule for UnknownComponentRule {
    fn id(&self) -> &str {
        "unknown_component"
    }

    fn name(&self) -> &str {
        "Unknown Component"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, netlist: &Netlist) -> Vec<Issue> {
        netlist
            .components
            .iter()
            .filter(|c| c.kind == ComponentKind::Unknown)
            .map(|c| {
                Issue::new(
                    self,
                    format!("Line {} is not a recognized component: {}", c.line, c.raw_line),
                )
                .at(c)
                .suggest("It is drawn as a placeholder box")
            })
            .collect()
    }
}

pub struct IncompleteComponentRule;

impl Rule for IncompleteComponentRule {
    fn id(&self) -> &str {
        "incomplete_component"
    }

    fn name(&self) -> &str {
        "Incomplete Component"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, netlist: &Netlist) -> Vec<Issue> {
        netlist
            .components
            .iter()
            .filter(|c| c.incomplete)
            .map(|c| {
                Issue::new(
                    self,
                    format!(
                        "{} ({}) connects {} of {} nodes",
                        c.reference,
                        c.kind.name(),
                        c.connected_nodes().count(),
                        c.kind.terminal_count()
                    ),
                )
                .at(c)
                .suggest("Unconnected leads are drawn as dangling stubs")
            })
            .collect()
    }
}

pub struct FloatingNodeRule;

impl Rule for FloatingNodeRule {
    fn id(&self) -> &str {
        "floating_node"
    }

    fn name(&self) -> &str {
        "Floating Node"
    }

    fn severity(&self) -> Severity {
        Severity::Suggestion
    }

    fn check(&self, netlist: &Netlist) -> Vec<Issue> {
        let mut touches: BTreeMap<&NodeId, Vec<&ComponentRecord>> = BTreeMap::new();
        for record in &netlist.components {
            for node in record.connected_nodes() {
                touches.entry(node).or_default().push(record);
            }
        }

        touches
            .into_iter()
            .filter(|(node, records)| !node.is_ground() && records.len() == 1)
            .map(|(node, records)| {
                let record = records[0];
                Issue::new(
                    self,
                    format!("Node {} is only connected to {}", node, record.reference),
                )
                .at(record)
                .suggest("Connect the node to another component or remove it")
            })
            .collect()
    }
}

pub struct ConnectivityRule;

impl Rule for ConnectivityRule {
    fn id(&self) -> &str {
        "connectivity"
    }

    fn name(&self) -> &str {
        "Ground Connectivity"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, netlist: &Netlist) -> Vec<Issue> {
        if !netlist.has_ground() {
            return Vec::new();
        }
        let graph = CircuitGraph::from_netlist(netlist);
        let reached = graph.components_reachable_from(&NodeId::ground());

        netlist
            .components
            .iter()
            .enumerate()
            .filter(|(position, record)| {
                !reached.contains(position) && record.connected_nodes().next().is_some()
            })
            .map(|(_, record)| {
                Issue::new(
                    self,
                    format!("{} is not connected to the ground net", record.reference),
                )
                .at(record)
                .suggest("Every branch needs a path back to node 0")
            })
            .collect()
    }
}

pub struct DuplicateReferenceRule;

impl Rule for DuplicateReferenceRule {
    fn id(&self) -> &str {
        "duplicate_reference"
    }

    fn name(&self) -> &str {
        "Duplicate Reference"
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, netlist: &Netlist) -> Vec<Issue> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut issues = Vec::new();
        for record in &netlist.components {
            // Ground markers carry no designator.
            if matches!(record.kind, ComponentKind::Ground | ComponentKind::Unknown) {
                continue;
            }
            if let Some(first_line) = seen.get(record.reference.as_str()) {
                issues.push(
                    Issue::new(
                        self,
                        format!(
                            "{} on line {} repeats the reference first used on line {}",
                            record.reference, record.line, first_line
                        ),
                    )
                    .at(record),
                );
            } else {
                seen.insert(record.reference.as_str(), record.line);
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn rule_ids(text: &str) -> Vec<String> {
        RulesEngine::with_default_rules()
            .analyze(&parse(text))
            .into_iter()
            .map(|i| i.rule_id)
            .collect()
    }

    #[test]
    fn test_clean_circuit_has_no_issues() {
        assert!(rule_ids("V1 1 0 9V\nR1 1 0 1k").is_empty());
    }

    #[test]
    fn test_empty_netlist() {
        assert_eq!(rule_ids(""), vec!["no_components"]);
    }

    #[test]
    fn test_missing_ground_and_source() {
        let ids = rule_ids("R1 1 2 1k\nR2 2 1 1k");
        assert!(ids.contains(&"ground_reference".to_string()));
        assert!(ids.contains(&"power_source".to_string()));
        assert!(!ids.contains(&"connectivity".to_string()));
    }

    #[test]
    fn test_missing_and_unreadable_values() {
        let issues = ComponentValueRule.check(&parse("V1 1 0\nR1 1 0 lots\nD1 1 0 D1N4148"));
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].component.as_deref(), Some("V1"));
        assert!(issues[0].message.contains("no value"));
        assert!(issues[1].message.contains("'lots'"));
        assert_eq!(issues[1].line, Some(2));
    }

    #[test]
    fn test_unknown_and_incomplete() {
        let ids = rule_ids("V1 1 0 9\nX1 1 0 foo\nR1 1");
        assert!(ids.contains(&"unknown_component".to_string()));
        assert!(ids.contains(&"incomplete_component".to_string()));
    }

    #[test]
    fn test_floating_node() {
        let issues = FloatingNodeRule.check(&parse("V1 1 0 9\nR1 1 2 1k"));
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("Node 2"));
        assert_eq!(issues[0].severity, Severity::Suggestion);
    }

    #[test]
    fn test_disconnected_branch() {
        let issues = ConnectivityRule.check(&parse("V1 1 0 9\nR1 1 0 1k\nR2 5 6 1k"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].component.as_deref(), Some("R2"));
    }

    #[test]
    fn test_duplicate_reference() {
        let issues = DuplicateReferenceRule.check(&parse("V1 1 0 9\nR1 1 2 1k\nR1 2 0 1k"));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Info);
        assert!(issues[0].message.contains("line 2"));
    }

    #[test]
    fn test_retain_rules() {
        let mut engine = RulesEngine::with_default_rules();
        engine.retain_rules(&["power_source".to_string()]);
        assert_eq!(engine.rule_ids(), vec!["power_source"]);
        let issues = engine.analyze(&parse("R1 1 0 1k"));
        assert_eq!(issues.len(), 1);
    }
}
