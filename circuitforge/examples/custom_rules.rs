//! Example: extending the checks and the symbol set (without CircuitForgeCore).
//! Run with: cargo run --example custom_rules [path/to/file.cir]

use circuitforge::render::{PathCmd, Point, Primitive, TextAnchor};
use circuitforge::{
    export, parse, ComponentKind, ComponentRecord, Issue, Netlist, Renderer, Rule, RulesEngine,
    Severity, SymbolRegistry, SymbolStrategy,
};
use std::path::Path;
use std::sync::Arc;

/// Flags resistors below one ohm, which usually means a lost unit prefix.
struct TinyResistorRule;

impl Rule for TinyResistorRule {
    fn id(&self) -> &str {
        "tiny_resistor"
    }

    fn name(&self) -> &str {
        "Tiny Resistor"
    }

    fn severity(&self) -> Severity {
        Severity::Suggestion
    }

    fn check(&self, netlist: &Netlist) -> Vec<Issue> {
        netlist
            .components
            .iter()
            .filter(|c| c.kind == ComponentKind::Resistor)
            .filter(|c| c.value.magnitude().is_some_and(|ohms| ohms < 1.0))
            .map(|c| Issue {
                id: format!("{}-{}", self.id(), c.reference),
                rule_id: self.id().to_string(),
                severity: self.severity(),
                message: format!("{} is below 1Ω", c.reference),
                component: Some(c.reference.clone()),
                line: Some(c.line),
                suggestion: Some("Check for a missing k or M prefix".to_string()),
            })
            .collect()
    }
}

/// Box-style resistor as drawn in IEC schematics.
struct IecResistorSymbol;

impl SymbolStrategy for IecResistorSymbol {
    fn name(&self) -> &str {
        "resistor_iec"
    }

    fn primitives(&self, _record: &ComponentRecord) -> Vec<Primitive> {
        vec![
            Primitive::path(vec![PathCmd::MoveTo(-30.0, 0.0), PathCmd::LineTo(-18.0, 0.0)]),
            Primitive::Rect {
                origin: Point::new(-18.0, -7.0),
                width: 36.0,
                height: 14.0,
            },
            Primitive::path(vec![PathCmd::MoveTo(18.0, 0.0), PathCmd::LineTo(30.0, 0.0)]),
            Primitive::Text {
                at: Point::new(0.0, 4.0),
                text: "R".to_string(),
                anchor: TextAnchor::Middle,
            },
        ]
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/divider.cir".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example custom_rules [path/to/file.cir]");
        std::process::exit(1);
    }

    let netlist = parse(&std::fs::read_to_string(path)?);

    let mut engine = RulesEngine::with_default_rules();
    engine.add_rule(Arc::new(TinyResistorRule));
    let issues = engine.analyze(&netlist);

    println!("Custom checks found {} issues for {}", issues.len(), path.display());
    for issue in &issues {
        println!("  [{:?}] {}", issue.severity, issue.message);
        if let Some(ref comp) = issue.component {
            println!("    Component: {}", comp);
        }
    }

    let mut registry = SymbolRegistry::with_default_symbols();
    registry.register(ComponentKind::Resistor, Arc::new(IecResistorSymbol));
    let drawing = Renderer::new(registry).render(&netlist);
    std::fs::write("circuit_iec.svg", export(&drawing)?)?;
    println!("Schematic written to circuit_iec.svg");

    let critical = issues.iter().filter(|i| matches!(i.severity, Severity::Error)).count();
    if critical > 0 {
        std::process::exit(1);
    }
    Ok(())
}
