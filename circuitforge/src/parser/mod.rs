pub mod clean;
pub mod netlist;
pub mod value;

// Re-export for convenience
pub use clean::clean_model_output;
pub use netlist::{parse, ComponentKind, ComponentRecord, Netlist, NodeId};
pub use value::{format_value, parse_value, UnitKind, Value};
