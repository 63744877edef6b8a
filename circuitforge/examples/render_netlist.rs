//! Render a netlist file to an SVG schematic and print the check results.
//! Run with: cargo run --example render_netlist [path/to/file.cir] [out.svg]

use circuitforge::prelude::*;
use std::path::Path;

fn main() -> Result<(), ForgeError> {
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| "tests/fixtures/divider.cir".to_string());
    let out = args.next().unwrap_or_else(|| "circuit.svg".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example render_netlist [path/to/file.cir] [out.svg]");
        std::process::exit(1);
    }

    let generation = CircuitForgeCore::from_file(path, &GenerationOptions::default())?;

    println!("Components in {}:", path.display());
    for row in &generation.components {
        println!(
            "  {:<6} {:<16} {:<12} {}",
            row.reference,
            row.kind,
            row.nodes.join(" "),
            row.value
        );
    }
    println!();

    if generation.total_issues() == 0 {
        println!("No issues found.");
    }
    for issue in &generation.issues {
        println!("  [{}] {}", issue.severity.label(), issue.message);
    }

    std::fs::write(&out, generation.svg(Theme::Download)?)?;
    println!("\nSchematic written to {}", out);
    Ok(())
}
