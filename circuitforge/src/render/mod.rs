pub mod drawing;
pub mod layout;
pub mod symbols;

use crate::parser::Netlist;

// Re-export for convenience
pub use drawing::{
    Bounds, Drawing, GroundMarker, Orientation, PathCmd, PlacedSymbol, Point, Primitive, Segment,
    Terminal, TextAnchor,
};
pub use layout::Renderer;
pub use symbols::{SymbolRegistry, SymbolStrategy};

/// Render a netlist with the default symbol set.
pub fn render(netlist: &Netlist) -> Drawing {
    Renderer::default().render(netlist)
}
