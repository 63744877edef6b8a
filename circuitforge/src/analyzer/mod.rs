pub mod graph;
pub mod rules;

// Re-export for convenience
pub use graph::CircuitGraph;
pub use rules::*;
