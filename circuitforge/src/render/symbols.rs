//! Component symbol definitions.
//!
//! Each component kind maps to one [`SymbolStrategy`] through a
//! [`SymbolRegistry`]. Symbols are drawn in a local frame centered at (0, 0);
//! two-terminal symbols span x = -30..30 with their leads on y = 0.

use std::collections::HashMap;
use std::sync::Arc;

use crate::parser::{ComponentKind, ComponentRecord};
use crate::render::drawing::{PathCmd, Point, Primitive, TextAnchor};

/// Half the lead-to-lead span of a two-terminal symbol.
pub const HALF_SPAN: f64 = 30.0;

/// Draws one kind of component
pub trait SymbolStrategy: Send + Sync {
    /// Symbol identifier written to the drawing and the SVG
    fn name(&self) -> &str;

    /// Local-frame width and height
    fn size(&self) -> (f64, f64) {
        (2.0 * HALF_SPAN, 30.0)
    }

    /// Local-frame terminal positions for a record with `count` terminals
    fn terminals(&self, _count: usize) -> Vec<Point> {
        vec![Point::new(-HALF_SPAN, 0.0), Point::new(HALF_SPAN, 0.0)]
    }

    /// Whether the symbol may be turned a half turn during layout
    fn reversible(&self) -> bool {
        true
    }

    fn primitives(&self, record: &ComponentRecord) -> Vec<Primitive>;
}

/// Kind → symbol lookup with a placeholder fallback
#[derive(Clone)]
pub struct SymbolRegistry {
    strategies: HashMap<ComponentKind, Arc<dyn SymbolStrategy>>,
    placeholder: Arc<dyn SymbolStrategy>,
}

impl SymbolRegistry {
    /// Empty registry: every kind draws the placeholder
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
            placeholder: Arc::new(PlaceholderSymbol),
        }
    }

    pub fn with_default_symbols() -> Self {
        let mut registry = Self::new();
        registry.register(ComponentKind::Resistor, Arc::new(ResistorSymbol));
        registry.register(ComponentKind::Capacitor, Arc::new(CapacitorSymbol));
        registry.register(ComponentKind::Inductor, Arc::new(InductorSymbol));
        registry.register(ComponentKind::VoltageSource, Arc::new(VoltageSourceSymbol));
        registry.register(ComponentKind::CurrentSource, Arc::new(CurrentSourceSymbol));
        registry.register(ComponentKind::Diode, Arc::new(DiodeSymbol));
        registry.register(ComponentKind::Ground, Arc::new(GroundSymbol));
        registry.register(ComponentKind::Wire, Arc::new(WireSymbol));
        registry.register(ComponentKind::Bjt, Arc::new(BjtSymbol));
        registry.register(ComponentKind::Mosfet, Arc::new(MosfetSymbol));
        registry.register(ComponentKind::Switch, Arc::new(SwitchSymbol));
        registry
    }

    /// Register or replace the strategy for `kind`
    pub fn register(&mut self, kind: ComponentKind, strategy: Arc<dyn SymbolStrategy>) {
        self.strategies.insert(kind, strategy);
    }

    pub fn get(&self, kind: ComponentKind) -> &Arc<dyn SymbolStrategy> {
        self.strategies.get(&kind).unwrap_or(&self.placeholder)
    }

    pub fn placeholder(&self) -> &Arc<dyn SymbolStrategy> {
        &self.placeholder
    }

    pub fn is_registered(&self, kind: ComponentKind) -> bool {
        self.strategies.contains_key(&kind)
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::with_default_symbols()
    }
}

// ---------------------------------------------------------------------------
// Symbol definitions
// ---------------------------------------------------------------------------

fn leads(inner: f64) -> Primitive {
    Primitive::path(vec![
        PathCmd::MoveTo(-HALF_SPAN, 0.0),
        PathCmd::LineTo(-inner, 0.0),
        PathCmd::MoveTo(inner, 0.0),
        PathCmd::LineTo(HALF_SPAN, 0.0),
    ])
}

/// American-style zigzag resistor.
pub struct ResistorSymbol;

impl SymbolStrategy for ResistorSymbol {
    fn name(&self) -> &str {
        "resistor"
    }

    fn primitives(&self, _record: &ComponentRecord) -> Vec<Primitive> {
        vec![Primitive::path(vec![
            PathCmd::MoveTo(-HALF_SPAN, 0.0),
            PathCmd::LineTo(-18.0, 0.0),
            PathCmd::LineTo(-15.0, -8.0),
            PathCmd::LineTo(-9.0, 8.0),
            PathCmd::LineTo(-3.0, -8.0),
            PathCmd::LineTo(3.0, 8.0),
            PathCmd::LineTo(9.0, -8.0),
            PathCmd::LineTo(15.0, 8.0),
            PathCmd::LineTo(18.0, 0.0),
            PathCmd::LineTo(HALF_SPAN, 0.0),
        ])]
    }
}

/// Non-polarized capacitor: two parallel plates.
pub struct CapacitorSymbol;

impl SymbolStrategy for CapacitorSymbol {
    fn name(&self) -> &str {
        "capacitor"
    }

    fn primitives(&self, _record: &ComponentRecord) -> Vec<Primitive> {
        vec![
            leads(4.0),
            Primitive::path(vec![
                PathCmd::MoveTo(-4.0, -14.0),
                PathCmd::LineTo(-4.0, 14.0),
                PathCmd::MoveTo(4.0, -14.0),
                PathCmd::LineTo(4.0, 14.0),
            ]),
        ]
    }
}

/// Inductor: four coil bumps.
pub struct InductorSymbol;

impl SymbolStrategy for InductorSymbol {
    fn name(&self) -> &str {
        "inductor"
    }

    fn primitives(&self, _record: &ComponentRecord) -> Vec<Primitive> {
        let mut cmds = vec![
            PathCmd::MoveTo(-HALF_SPAN, 0.0),
            PathCmd::LineTo(-20.0, 0.0),
        ];
        for end in [-10.0, 0.0, 10.0, 20.0] {
            cmds.push(PathCmd::ArcTo {
                x: end,
                y: 0.0,
                radius: 5.0,
                sweep: true,
            });
        }
        cmds.push(PathCmd::LineTo(HALF_SPAN, 0.0));
        vec![Primitive::path(cmds)]
    }
}

const SOURCE_RADIUS: f64 = 16.0;

/// Voltage source: circle with polarity marks; the first node is positive.
pub struct VoltageSourceSymbol;

impl SymbolStrategy for VoltageSourceSymbol {
    fn name(&self) -> &str {
        "voltage_source"
    }

    fn size(&self) -> (f64, f64) {
        (2.0 * HALF_SPAN, 2.0 * SOURCE_RADIUS)
    }

    fn primitives(&self, _record: &ComponentRecord) -> Vec<Primitive> {
        vec![
            leads(SOURCE_RADIUS),
            Primitive::Circle {
                center: Point::new(0.0, 0.0),
                radius: SOURCE_RADIUS,
                filled: false,
            },
            // Plus
            Primitive::path(vec![
                PathCmd::MoveTo(-11.0, 0.0),
                PathCmd::LineTo(-5.0, 0.0),
                PathCmd::MoveTo(-8.0, -3.0),
                PathCmd::LineTo(-8.0, 3.0),
            ]),
            // Minus
            Primitive::path(vec![PathCmd::MoveTo(5.0, 0.0), PathCmd::LineTo(11.0, 0.0)]),
        ]
    }
}

/// Current source: circle with an arrow from the first node to the second.
pub struct CurrentSourceSymbol;

impl SymbolStrategy for CurrentSourceSymbol {
    fn name(&self) -> &str {
        "current_source"
    }

    fn size(&self) -> (f64, f64) {
        (2.0 * HALF_SPAN, 2.0 * SOURCE_RADIUS)
    }

    fn primitives(&self, _record: &ComponentRecord) -> Vec<Primitive> {
        vec![
            leads(SOURCE_RADIUS),
            Primitive::Circle {
                center: Point::new(0.0, 0.0),
                radius: SOURCE_RADIUS,
                filled: false,
            },
            Primitive::path(vec![PathCmd::MoveTo(-9.0, 0.0), PathCmd::LineTo(4.0, 0.0)]),
            Primitive::filled_path(vec![
                PathCmd::MoveTo(10.0, 0.0),
                PathCmd::LineTo(3.0, -4.0),
                PathCmd::LineTo(3.0, 4.0),
                PathCmd::Close,
            ]),
        ]
    }
}

/// Diode: filled triangle and cathode bar; the first node is the anode.
pub struct DiodeSymbol;

impl SymbolStrategy for DiodeSymbol {
    fn name(&self) -> &str {
        "diode"
    }

    fn primitives(&self, _record: &ComponentRecord) -> Vec<Primitive> {
        vec![
            leads(8.0),
            Primitive::filled_path(vec![
                PathCmd::MoveTo(-8.0, -10.0),
                PathCmd::LineTo(-8.0, 10.0),
                PathCmd::LineTo(8.0, 0.0),
                PathCmd::Close,
            ]),
            Primitive::path(vec![PathCmd::MoveTo(8.0, -10.0), PathCmd::LineTo(8.0, 10.0)]),
        ]
    }
}

/// Ground: lead plus three shrinking bars. Drawn pointing right; the layout
/// turns it to point down.
pub struct GroundSymbol;

impl SymbolStrategy for GroundSymbol {
    fn name(&self) -> &str {
        "ground"
    }

    fn size(&self) -> (f64, f64) {
        (30.0, 24.0)
    }

    fn terminals(&self, _count: usize) -> Vec<Point> {
        vec![Point::new(-15.0, 0.0)]
    }

    fn reversible(&self) -> bool {
        false
    }

    fn primitives(&self, _record: &ComponentRecord) -> Vec<Primitive> {
        ground_primitives()
    }
}

pub(crate) fn ground_primitives() -> Vec<Primitive> {
    vec![Primitive::path(vec![
        PathCmd::MoveTo(-15.0, 0.0),
        PathCmd::LineTo(0.0, 0.0),
        PathCmd::MoveTo(0.0, -12.0),
        PathCmd::LineTo(0.0, 12.0),
        PathCmd::MoveTo(5.0, -8.0),
        PathCmd::LineTo(5.0, 8.0),
        PathCmd::MoveTo(10.0, -4.0),
        PathCmd::LineTo(10.0, 4.0),
    ])]
}

/// Plain wire between two nodes.
pub struct WireSymbol;

impl SymbolStrategy for WireSymbol {
    fn name(&self) -> &str {
        "wire"
    }

    fn size(&self) -> (f64, f64) {
        (2.0 * HALF_SPAN, 6.0)
    }

    fn primitives(&self, _record: &ComponentRecord) -> Vec<Primitive> {
        vec![Primitive::path(vec![
            PathCmd::MoveTo(-HALF_SPAN, 0.0),
            PathCmd::LineTo(HALF_SPAN, 0.0),
        ])]
    }
}

/// NPN-style bipolar transistor; nodes are collector, base, emitter.
pub struct BjtSymbol;

impl SymbolStrategy for BjtSymbol {
    fn name(&self) -> &str {
        "bjt"
    }

    fn size(&self) -> (f64, f64) {
        (60.0, 60.0)
    }

    fn terminals(&self, _count: usize) -> Vec<Point> {
        vec![
            Point::new(10.0, -30.0),
            Point::new(-30.0, 0.0),
            Point::new(10.0, 30.0),
        ]
    }

    fn reversible(&self) -> bool {
        false
    }

    fn primitives(&self, _record: &ComponentRecord) -> Vec<Primitive> {
        vec![
            Primitive::Circle {
                center: Point::new(0.0, 0.0),
                radius: 20.0,
                filled: false,
            },
            Primitive::path(vec![
                // Base
                PathCmd::MoveTo(-30.0, 0.0),
                PathCmd::LineTo(-8.0, 0.0),
                PathCmd::MoveTo(-8.0, -12.0),
                PathCmd::LineTo(-8.0, 12.0),
                // Collector
                PathCmd::MoveTo(-8.0, -6.0),
                PathCmd::LineTo(10.0, -18.0),
                PathCmd::LineTo(10.0, -30.0),
                // Emitter
                PathCmd::MoveTo(-8.0, 6.0),
                PathCmd::LineTo(10.0, 18.0),
                PathCmd::LineTo(10.0, 30.0),
            ]),
            // Emitter arrow, pointing outwards
            Primitive::filled_path(vec![
                PathCmd::MoveTo(7.0, 16.0),
                PathCmd::LineTo(-0.8, 15.0),
                PathCmd::LineTo(3.1, 9.2),
                PathCmd::Close,
            ]),
        ]
    }
}

/// N-channel MOSFET; nodes are drain, gate, source and optional bulk.
pub struct MosfetSymbol;

impl SymbolStrategy for MosfetSymbol {
    fn name(&self) -> &str {
        "mosfet"
    }

    fn size(&self) -> (f64, f64) {
        (60.0, 60.0)
    }

    fn terminals(&self, count: usize) -> Vec<Point> {
        let mut points = vec![
            Point::new(10.0, -30.0),
            Point::new(-30.0, 0.0),
            Point::new(10.0, 30.0),
        ];
        if count >= 4 {
            points.push(Point::new(30.0, 0.0));
        }
        points
    }

    fn reversible(&self) -> bool {
        false
    }

    fn primitives(&self, record: &ComponentRecord) -> Vec<Primitive> {
        let mut cmds = vec![
            // Gate
            PathCmd::MoveTo(-30.0, 0.0),
            PathCmd::LineTo(-12.0, 0.0),
            PathCmd::MoveTo(-12.0, -14.0),
            PathCmd::LineTo(-12.0, 14.0),
            // Channel
            PathCmd::MoveTo(-6.0, -16.0),
            PathCmd::LineTo(-6.0, -6.0),
            PathCmd::MoveTo(-6.0, -3.0),
            PathCmd::LineTo(-6.0, 3.0),
            PathCmd::MoveTo(-6.0, 6.0),
            PathCmd::LineTo(-6.0, 16.0),
            // Drain
            PathCmd::MoveTo(-6.0, -10.0),
            PathCmd::LineTo(10.0, -10.0),
            PathCmd::LineTo(10.0, -30.0),
            // Source
            PathCmd::MoveTo(-6.0, 10.0),
            PathCmd::LineTo(10.0, 10.0),
            PathCmd::LineTo(10.0, 30.0),
            // Body tied to source
            PathCmd::MoveTo(-6.0, 0.0),
            PathCmd::LineTo(10.0, 0.0),
            PathCmd::LineTo(10.0, 10.0),
        ];
        if record.nodes.len() >= 4 {
            cmds.push(PathCmd::MoveTo(10.0, 0.0));
            cmds.push(PathCmd::LineTo(30.0, 0.0));
        }
        vec![
            Primitive::path(cmds),
            Primitive::filled_path(vec![
                PathCmd::MoveTo(-6.0, 0.0),
                PathCmd::LineTo(0.0, -4.0),
                PathCmd::LineTo(0.0, 4.0),
                PathCmd::Close,
            ]),
        ]
    }
}

/// Single-pole switch, drawn open.
pub struct SwitchSymbol;

impl SymbolStrategy for SwitchSymbol {
    fn name(&self) -> &str {
        "switch"
    }

    fn primitives(&self, _record: &ComponentRecord) -> Vec<Primitive> {
        vec![
            leads(14.0),
            Primitive::Circle {
                center: Point::new(-12.0, 0.0),
                radius: 2.0,
                filled: false,
            },
            Primitive::Circle {
                center: Point::new(12.0, 0.0),
                radius: 2.0,
                filled: false,
            },
            Primitive::path(vec![PathCmd::MoveTo(-10.0, -1.0), PathCmd::LineTo(12.0, -12.0)]),
        ]
    }
}

const BOX_HALF_WIDTH: f64 = 22.0;
const BOX_HALF_HEIGHT: f64 = 14.0;
const PIN_PITCH: f64 = 10.0;

/// Labeled rectangle for anything without a dedicated symbol.
pub struct PlaceholderSymbol;

impl SymbolStrategy for PlaceholderSymbol {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn size(&self) -> (f64, f64) {
        (2.0 * HALF_SPAN, 2.0 * HALF_SPAN)
    }

    fn terminals(&self, count: usize) -> Vec<Point> {
        let mut points = vec![
            Point::new(-HALF_SPAN, 0.0),
            Point::new(HALF_SPAN, 0.0),
            Point::new(0.0, -HALF_SPAN),
            Point::new(0.0, HALF_SPAN),
        ];
        // Further pins alternate between the side edges, stepping away from the middle.
        for extra in 0..count.saturating_sub(points.len()) {
            let x = if extra % 2 == 0 { -HALF_SPAN } else { HALF_SPAN };
            let step = (extra / 4 + 1) as f64 * PIN_PITCH;
            let y = if (extra / 2) % 2 == 0 { -step } else { step };
            points.push(Point::new(x, y));
        }
        points.truncate(count);
        points
    }

    fn reversible(&self) -> bool {
        false
    }

    fn primitives(&self, record: &ComponentRecord) -> Vec<Primitive> {
        let mut cmds = Vec::new();
        for terminal in self.terminals(record.connected_nodes().count()) {
            // Lead from the box edge out to the terminal.
            let edge = if terminal.x != 0.0 {
                Point::new(
                    terminal.x.signum() * BOX_HALF_WIDTH,
                    terminal.y.clamp(-BOX_HALF_HEIGHT, BOX_HALF_HEIGHT),
                )
            } else {
                Point::new(0.0, terminal.y.signum() * BOX_HALF_HEIGHT)
            };
            cmds.push(PathCmd::MoveTo(edge.x, edge.y));
            cmds.push(PathCmd::LineTo(terminal.x, terminal.y));
        }

        let mut primitives = vec![Primitive::Rect {
            origin: Point::new(-BOX_HALF_WIDTH, -BOX_HALF_HEIGHT),
            width: 2.0 * BOX_HALF_WIDTH,
            height: 2.0 * BOX_HALF_HEIGHT,
        }];
        if !cmds.is_empty() {
            primitives.push(Primitive::path(cmds));
        }
        primitives.push(Primitive::Text {
            at: Point::new(0.0, 4.0),
            text: placeholder_text(record),
            anchor: TextAnchor::Middle,
        });
        primitives
    }
}

fn placeholder_text(record: &ComponentRecord) -> String {
    let text: String = record.reference.chars().take(6).collect();
    if text.is_empty() {
        "?".to_string()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn test_every_kind_has_a_symbol() {
        let registry = SymbolRegistry::with_default_symbols();
        for kind in ComponentKind::ALL {
            if kind == ComponentKind::Unknown {
                assert!(!registry.is_registered(kind));
                assert_eq!(registry.get(kind).name(), "placeholder");
            } else {
                assert!(registry.is_registered(kind), "{kind:?}");
                assert_ne!(registry.get(kind).name(), "placeholder");
            }
        }
        assert_eq!(registry.get(ComponentKind::Resistor).name(), "resistor");
    }

    #[test]
    fn test_register_replaces_strategy() {
        let mut registry = SymbolRegistry::new();
        assert_eq!(registry.get(ComponentKind::Resistor).name(), "placeholder");
        registry.register(ComponentKind::Resistor, Arc::new(WireSymbol));
        assert_eq!(registry.get(ComponentKind::Resistor).name(), "wire");
    }

    #[test]
    fn test_terminal_counts() {
        let registry = SymbolRegistry::default();
        assert_eq!(registry.get(ComponentKind::Ground).terminals(1).len(), 1);
        assert_eq!(registry.get(ComponentKind::Bjt).terminals(3).len(), 3);
        assert_eq!(registry.get(ComponentKind::Mosfet).terminals(3).len(), 3);
        assert_eq!(registry.get(ComponentKind::Mosfet).terminals(4).len(), 4);
        assert_eq!(registry.placeholder().terminals(0).len(), 0);
        assert_eq!(registry.placeholder().terminals(3).len(), 3);
    }

    #[test]
    fn test_placeholder_takes_any_pin_count() {
        let pins = PlaceholderSymbol.terminals(9);
        assert_eq!(pins.len(), 9);
        for (i, a) in pins.iter().enumerate() {
            assert!(pins[i + 1..].iter().all(|b| b != a), "pin {} repeats", i);
        }
    }

    #[test]
    fn test_placeholder_box_shows_reference() {
        let netlist = parse("X1 1 0 foo");
        let primitives = PlaceholderSymbol.primitives(&netlist.components[0]);
        assert!(matches!(primitives[0], Primitive::Rect { .. }));
        assert!(primitives
            .iter()
            .any(|p| matches!(p, Primitive::Text { text, .. } if text == "X1")));
    }

    #[test]
    fn test_symbols_are_finite() {
        let registry = SymbolRegistry::default();
        let netlist = parse("R1 1 2 1k\nM1 d g s b NMOS\nX1 1 0 foo");
        for record in &netlist.components {
            for kind in ComponentKind::ALL {
                assert!(registry
                    .get(kind)
                    .primitives(record)
                    .iter()
                    .all(Primitive::is_finite));
            }
        }
    }
}
