//! CircuitForge - circuit description to SPICE netlist to schematic SVG
//!
//! A seq2seq model turns a plain-language description into SPICE-like
//! netlist text. The library cleans and parses that text, checks it, lays
//! out a schematic, and exports it as SVG.
//!
//! # Quick Start
//!
//! ```no_run
//! use circuitforge::{CircuitForgeCore, GenerationOptions, Translator};
//!
//! # async fn run() -> Result<(), circuitforge::ForgeError> {
//! let generation = CircuitForgeCore::generate(
//!     Translator::global(),
//!     "5V battery with 100 ohm resistor and 10uF capacitor",
//!     &GenerationOptions::default(),
//! )
//! .await?;
//!
//! println!("{}", generation.netlist_text);
//! std::fs::write("circuit.svg", generation.svg(circuitforge::Theme::Download)?)?;
//! # Ok(())
//! # }
//! ```
//!
//! Without a model, start from netlist text:
//!
//! ```
//! use circuitforge::{export, parse, render};
//!
//! let netlist = parse("V1 1 0 9V\nR1 1 0 1k");
//! let drawing = render(&netlist);
//! let svg = export(&drawing).unwrap();
//! assert!(String::from_utf8(svg).unwrap().contains("<svg"));
//! ```
//!
//! # Features
//!
//! - **Tolerant parsing**: every input yields a netlist; unknown lines become placeholders
//! - **Netlist checks**: ground reference, power source, values, connectivity
//! - **Schematic layout**: pluggable symbol registry, junctions, ground markers
//! - **SVG export**: display (dark UI) and download (black on white) themes
//! - **Inference**: hosted Hugging Face or local Ollama, loaded once per process

pub mod ai;
pub mod analyzer;
pub mod config;
pub mod core;
pub mod export;
pub mod parser;
pub mod render;

// Re-export main types
pub use ai::{normalize_prompt, InferenceProvider, ProviderError, TranslateError, Translator};
pub use analyzer::rules::{Issue, Rule, RulesEngine, Severity};
pub use config::{ConfigError, ForgeConfig, ProviderKind};
pub use core::{
    CircuitForgeCore, ComponentRow, ForgeError, Generation, GenerationOptions, GenerationStats,
};
pub use export::{export, export_with_theme, ExportError, Theme};
pub use parser::{clean_model_output, parse, ComponentKind, ComponentRecord, Netlist, NodeId, Value};
pub use render::{render, Drawing, Renderer, SymbolRegistry, SymbolStrategy};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CircuitForgeCore, Drawing, ForgeError, Generation, GenerationOptions, Issue, Netlist,
        Severity, Theme, Translator,
    };
}
