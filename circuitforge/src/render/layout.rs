//! Schematic placement and wiring.
//!
//! Components are placed left to right in netlist order. A component that
//! shares a node with the one before it chains on along the same row; one
//! that only reconnects to nodes seen earlier starts a new row under the
//! leftmost of those nodes. Every node keeps the first terminal that touched
//! it as its anchor and later terminals are wired back to that anchor.

use std::collections::HashMap;

use crate::parser::{ComponentKind, ComponentRecord, Netlist, NodeId};
use crate::render::drawing::{
    Bounds, Drawing, GroundMarker, Orientation, PlacedSymbol, Point, Segment, Terminal,
};
use crate::render::symbols::{ground_primitives, SymbolRegistry};

/// Horizontal space between neighbouring symbols.
pub const GAP: f64 = 30.0;
/// Vertical distance between rows.
pub const ROW_HEIGHT: f64 = 140.0;
/// How far ground symbols hang below the node they attach to.
const GROUND_DROP: f64 = 45.0;
/// Spacing between ground symbols sharing one anchor.
const GROUND_SPACING: f64 = 30.0;
/// Local terminal of the ground symbol, before rotation.
const GROUND_TERMINAL: Point = Point::new(-15.0, 0.0);
const STUB_LENGTH: f64 = 12.0;
/// Return paths between far-apart terminals on one row run below it.
const LANE_BASE: f64 = 36.0;
const LANE_STEP: f64 = 8.0;
const LANE_COUNT: usize = 4;
/// Room for the reference above and the value below a symbol.
const LABEL_SPACE: f64 = 18.0;
const MARGIN: f64 = 24.0;
const EPSILON: f64 = 1e-6;

/// Lays out a [`Netlist`] using a [`SymbolRegistry`]
#[derive(Clone, Default)]
pub struct Renderer {
    registry: SymbolRegistry,
}

impl Renderer {
    pub fn new(registry: SymbolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut SymbolRegistry {
        &mut self.registry
    }

    /// Produce a drawing for every record. Never fails.
    pub fn render(&self, netlist: &Netlist) -> Drawing {
        let mut layout = Layout::new(&self.registry);
        let mut placed: Vec<Option<PlacedSymbol>> = vec![None; netlist.components.len()];

        // Ground records attach under their node, so they wait until the
        // rest of the circuit has claimed its anchors.
        for (index, record) in netlist.components.iter().enumerate() {
            if record.kind != ComponentKind::Ground {
                placed[index] = Some(layout.place(record));
            }
        }
        for (index, record) in netlist.components.iter().enumerate() {
            if record.kind == ComponentKind::Ground {
                placed[index] = Some(layout.place_ground(record));
            }
        }

        let symbols: Vec<PlacedSymbol> = placed.into_iter().flatten().collect();
        let drawing = layout.finish(symbols);
        tracing::debug!(
            "Rendered {} symbols, {} segments, {} junctions",
            drawing.symbols.len(),
            drawing.segments.len(),
            drawing.junctions.len()
        );
        drawing
    }
}

struct Layout<'a> {
    registry: &'a SymbolRegistry,
    cursor_x: f64,
    row_y: f64,
    anchors: HashMap<NodeId, Point>,
    terminal_counts: HashMap<NodeId, usize>,
    /// Anchor order, for deterministic junction output
    anchor_order: Vec<NodeId>,
    previous_nodes: Vec<NodeId>,
    ground_slots: HashMap<NodeId, usize>,
    segments: Vec<Segment>,
    open_ends: Vec<Point>,
    lane: usize,
}

impl<'a> Layout<'a> {
    fn new(registry: &'a SymbolRegistry) -> Self {
        Self {
            registry,
            cursor_x: 0.0,
            row_y: 0.0,
            anchors: HashMap::new(),
            terminal_counts: HashMap::new(),
            anchor_order: Vec::new(),
            previous_nodes: Vec::new(),
            ground_slots: HashMap::new(),
            segments: Vec::new(),
            open_ends: Vec::new(),
            lane: 0,
        }
    }

    fn place(&mut self, record: &ComponentRecord) -> PlacedSymbol {
        let strategy = self.registry.get(record.kind).clone();
        let local_terminals = strategy.terminals(terminal_count(record));
        let connected: Vec<NodeId> = record.connected_nodes().cloned().collect();

        let chained = connected.iter().any(|n| self.previous_nodes.contains(n));
        let leftmost_anchor = connected
            .iter()
            .filter_map(|n| self.anchors.get(n))
            .map(|p| p.x)
            .reduce(f64::min);

        if !chained {
            if let Some(x) = leftmost_anchor {
                // Branch back to earlier nodes: new row under the leftmost one.
                self.row_y += ROW_HEIGHT;
                self.cursor_x = x;
            }
        }

        let orientation = if strategy.reversible() && local_terminals.len() == 2 {
            self.choose_orientation(record, chained)
        } else {
            Orientation::Right
        };

        let (width, height) = strategy.size();
        let placed_width = match orientation {
            Orientation::Down => height,
            _ => width,
        };
        let origin = Point::new(self.cursor_x + placed_width / 2.0, self.row_y);
        self.cursor_x = origin.x + placed_width / 2.0 + GAP;

        let terminals = self.attach(record, origin, orientation, &local_terminals);
        self.previous_nodes = connected;

        PlacedSymbol {
            reference: record.reference.clone(),
            kind: record.kind,
            symbol: strategy.name().to_string(),
            label: record.value_label(),
            origin,
            orientation,
            width,
            height,
            primitives: strategy.primitives(record),
            terminals,
            line: record.line,
        }
    }

    fn place_ground(&mut self, record: &ComponentRecord) -> PlacedSymbol {
        let strategy = self.registry.get(record.kind).clone();
        let local_terminals = strategy.terminals(1);
        let (width, height) = strategy.size();
        let orientation = Orientation::Down;
        let local = local_terminals.first().copied().unwrap_or(GROUND_TERMINAL);
        let rotated = orientation.apply(local);

        let node = record.nodes.first().filter(|n| !n.is_floating());
        let terminal_point = match node.and_then(|n| self.anchors.get(n).copied()) {
            Some(anchor) => {
                let slot = self.ground_slots.entry(anchor_key(node)).or_insert(0);
                let point = Point::new(
                    anchor.x + *slot as f64 * GROUND_SPACING,
                    anchor.y + GROUND_DROP,
                );
                *slot += 1;
                point
            }
            None => {
                // Nothing to hang from yet: take the next slot on the row.
                let point = Point::new(self.cursor_x + height / 2.0, self.row_y);
                self.cursor_x += height + GAP;
                point
            }
        };
        let origin = Point::new(terminal_point.x - rotated.x, terminal_point.y - rotated.y);
        let terminals = self.attach(record, origin, orientation, &local_terminals);

        PlacedSymbol {
            reference: record.reference.clone(),
            kind: record.kind,
            symbol: strategy.name().to_string(),
            label: None,
            origin,
            orientation,
            width,
            height,
            primitives: strategy.primitives(record),
            terminals,
            line: record.line,
        }
    }

    /// Put the node that is already on the canvas on the left-hand side.
    fn choose_orientation(&self, record: &ComponentRecord, chained: bool) -> Orientation {
        let node_at = |i: usize| record.nodes.get(i).filter(|n| !n.is_floating());
        let (first, second) = (node_at(0), node_at(1));
        let anchor_x = |n: Option<&NodeId>| n.and_then(|n| self.anchors.get(n)).map(|p| p.x);

        let prefer_second = if chained {
            let in_previous = |n: Option<&NodeId>| n.map_or(false, |n| self.previous_nodes.contains(n));
            match (in_previous(first), in_previous(second)) {
                (false, true) => true,
                // Both shared: the closer anchor goes left.
                (true, true) => anchor_x(second) > anchor_x(first),
                _ => false,
            }
        } else {
            match (anchor_x(first), anchor_x(second)) {
                (None, Some(_)) => true,
                (Some(a), Some(b)) => b < a,
                (Some(_), None) => false,
                // Fresh component: keep ground on the left so the chain
                // grows from the positive side.
                (None, None) => {
                    second.map_or(false, NodeId::is_ground) && !first.map_or(false, NodeId::is_ground)
                }
            }
        };

        if prefer_second && first != second {
            Orientation::Left
        } else {
            Orientation::Right
        }
    }

    fn attach(
        &mut self,
        record: &ComponentRecord,
        origin: Point,
        orientation: Orientation,
        local_terminals: &[Point],
    ) -> Vec<Terminal> {
        let mut terminals = Vec::with_capacity(local_terminals.len());
        for (index, local) in local_terminals.iter().enumerate() {
            let rotated = orientation.apply(*local);
            let point = Point::new(origin.x + rotated.x, origin.y + rotated.y);
            let node = record
                .nodes
                .get(index)
                .filter(|n| !n.is_floating())
                .cloned();

            match &node {
                Some(node) => self.connect(node, point),
                None => self.stub(point, rotated),
            }
            terminals.push(Terminal {
                point,
                dangling: node.is_none(),
                node,
            });
        }
        terminals
    }

    fn stub(&mut self, point: Point, outward: Point) {
        let (dx, dy) = if outward.x.abs() >= outward.y.abs() {
            (if outward.x < 0.0 { -1.0 } else { 1.0 }, 0.0)
        } else {
            (0.0, if outward.y < 0.0 { -1.0 } else { 1.0 })
        };
        let end = point.offset(dx * STUB_LENGTH, dy * STUB_LENGTH);
        self.segments.push(Segment {
            from: point,
            to: end,
            node: None,
        });
        self.open_ends.push(end);
    }

    fn connect(&mut self, node: &NodeId, point: Point) {
        *self.terminal_counts.entry(node.clone()).or_insert(0) += 1;
        match self.anchors.get(node).copied() {
            None => {
                self.anchors.insert(node.clone(), point);
                self.anchor_order.push(node.clone());
            }
            Some(anchor) => self.route(node, point, anchor),
        }
    }

    fn route(&mut self, node: &NodeId, from: Point, to: Point) {
        let same_row = (from.y - to.y).abs() < EPSILON;
        let same_column = (from.x - to.x).abs() < EPSILON;

        let points = if same_row && same_column {
            vec![]
        } else if same_column || (same_row && (from.x - to.x).abs() <= GAP + EPSILON) {
            vec![from, to]
        } else if same_row {
            // Run below the row so the line does not cross the symbols in between.
            let drop = LANE_BASE + LANE_STEP * (self.lane % LANE_COUNT) as f64;
            self.lane += 1;
            let y = from.y + drop;
            vec![from, Point::new(from.x, y), Point::new(to.x, y), to]
        } else {
            vec![from, Point::new(to.x, from.y), to]
        };

        for pair in points.windows(2) {
            self.segments.push(Segment {
                from: pair[0],
                to: pair[1],
                node: Some(node.clone()),
            });
        }
    }

    fn finish(mut self, symbols: Vec<PlacedSymbol>) -> Drawing {
        let ground = NodeId::ground();
        let ground_drawn = symbols.iter().any(|s| {
            s.kind == ComponentKind::Ground && s.terminals.iter().any(|t| t.node.as_ref() == Some(&ground))
        });

        let mut ground_markers = Vec::new();
        if !ground_drawn {
            if let Some(anchor) = self.anchors.get(&ground).copied() {
                let orientation = Orientation::Down;
                let rotated = orientation.apply(GROUND_TERMINAL);
                let terminal = Point::new(anchor.x, anchor.y + GROUND_DROP);
                self.route(&ground, terminal, anchor);
                *self.terminal_counts.entry(ground.clone()).or_insert(0) += 1;
                ground_markers.push(GroundMarker {
                    origin: Point::new(terminal.x - rotated.x, terminal.y - rotated.y),
                    orientation,
                    primitives: ground_primitives(),
                });
            }
        }

        let junctions: Vec<Point> = self
            .anchor_order
            .iter()
            .filter(|node| self.terminal_counts.get(*node).copied().unwrap_or(0) >= 3)
            .filter_map(|node| self.anchors.get(node).copied())
            .collect();

        let mut drawing = Drawing {
            symbols,
            segments: self.segments,
            junctions,
            open_ends: self.open_ends,
            ground_markers,
            bounds: Bounds::default(),
        };
        drawing.bounds = compute_bounds(&drawing);
        drawing
    }
}

fn anchor_key(node: Option<&NodeId>) -> NodeId {
    node.cloned().unwrap_or_else(NodeId::ground)
}

/// Terminals to draw for a record
fn terminal_count(record: &ComponentRecord) -> usize {
    match record.kind {
        ComponentKind::Unknown => record.connected_nodes().count(),
        kind => kind
            .terminal_count()
            .max(record.nodes.len().min(kind.max_terminals())),
    }
}

fn compute_bounds(drawing: &Drawing) -> Bounds {
    let mut bounds: Option<Bounds> = None;
    let mut include = |b: Bounds| match bounds.as_mut() {
        Some(existing) => existing.merge(&b),
        None => bounds = Some(b),
    };

    for symbol in &drawing.symbols {
        let extent = symbol.extent();
        include(Bounds::new(
            extent.min_x,
            extent.min_y - LABEL_SPACE,
            extent.max_x,
            extent.max_y + LABEL_SPACE,
        ));
    }
    for segment in &drawing.segments {
        include(Bounds::around(segment.from));
        include(Bounds::around(segment.to));
    }
    for point in drawing.open_ends.iter().chain(&drawing.junctions) {
        include(Bounds::around(*point).pad(4.0));
    }
    for marker in &drawing.ground_markers {
        include(Bounds::around(marker.origin).pad(15.0));
    }

    bounds.unwrap_or_default().pad(MARGIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn render(text: &str) -> Drawing {
        Renderer::default().render(&parse(text))
    }

    fn terminal_of<'a>(drawing: &'a Drawing, reference: &str, node: &str) -> &'a Terminal {
        let node = NodeId::new(node);
        drawing
            .symbol(reference)
            .and_then(|s| s.terminals.iter().find(|t| t.node.as_ref() == Some(&node)))
            .unwrap_or_else(|| panic!("{reference} has no terminal on {node}"))
    }

    #[test]
    fn test_series_chain_is_adjacent() {
        let drawing = render("V1 1 0 9\nR1 1 2 1k\nC1 2 0 1u");
        let v1 = drawing.symbol("V1").unwrap();
        let r1 = drawing.symbol("R1").unwrap();
        let c1 = drawing.symbol("C1").unwrap();
        assert_eq!(v1.origin.y, r1.origin.y);
        assert_eq!(r1.origin.y, c1.origin.y);
        assert!(v1.origin.x < r1.origin.x && r1.origin.x < c1.origin.x);

        // Node 1 runs straight from V1 to R1.
        let from = terminal_of(&drawing, "R1", "1").point;
        let to = terminal_of(&drawing, "V1", "1").point;
        assert!(drawing
            .segments_on(&NodeId::new("1"))
            .any(|s| s.from == from && s.to == to));
    }

    #[test]
    fn test_branch_starts_new_row() {
        let drawing = render("V1 1 0 9\nR1 1 2 1k\nC1 2 0 1u\nR2 1 3 1k\nR3 3 0 1k");
        let v1 = drawing.symbol("V1").unwrap();
        let r2 = drawing.symbol("R2").unwrap();
        let r3 = drawing.symbol("R3").unwrap();
        assert!(r2.origin.y > v1.origin.y);
        assert_eq!(r3.origin.y, r2.origin.y);

        // The branch hangs straight below the node it reuses.
        let top = terminal_of(&drawing, "V1", "1").point;
        let branch = terminal_of(&drawing, "R2", "1").point;
        assert_eq!(top.x, branch.x);
    }

    #[test]
    fn test_junction_for_three_terminals() {
        let drawing = render("V1 1 0 9\nR1 1 0 1k\nR2 1 0 2k");
        // Node 1 and node 0 both have three terminals.
        assert_eq!(drawing.junctions.len(), 2);
        let anchor = terminal_of(&drawing, "V1", "1").point;
        assert!(drawing.junctions.contains(&anchor));
    }

    #[test]
    fn test_incomplete_record_gets_stub() {
        let drawing = render("R1 1");
        let r1 = drawing.symbol("R1").unwrap();
        assert_eq!(r1.terminals.len(), 2);
        assert!(!r1.terminals[0].dangling);
        assert!(r1.terminals[1].dangling);
        assert_eq!(drawing.open_ends.len(), 1);
        assert_eq!(drawing.segments.iter().filter(|s| s.node.is_none()).count(), 1);
    }

    #[test]
    fn test_ground_marker_for_node_zero() {
        let drawing = render("V1 1 0 9\nR1 1 0 1k");
        assert_eq!(drawing.ground_markers.len(), 1);

        let drawing = render("V1 1 0 9\nR1 1 0 1k\nGND");
        assert!(drawing.ground_markers.is_empty());
        let gnd = drawing.symbol("GND").unwrap();
        assert_eq!(gnd.orientation, Orientation::Down);
        assert!(gnd.origin.y > drawing.symbol("V1").unwrap().origin.y);
    }

    #[test]
    fn test_no_ground_marker_without_ground() {
        let drawing = render("R1 1 2 1k");
        assert!(drawing.ground_markers.is_empty());
    }

    #[test]
    fn test_lone_ground_record() {
        let drawing = render("GND");
        assert_eq!(drawing.symbols.len(), 1);
        assert!(drawing.ground_markers.is_empty());
        assert!(drawing.bounds.is_finite());
    }

    #[test]
    fn test_unknown_renders_placeholder() {
        let drawing = render("X1 1 0 foo");
        let x1 = drawing.symbol("X1").unwrap();
        assert_eq!(x1.symbol, "placeholder");
        assert_eq!(x1.terminals.len(), 2);
    }

    #[test]
    fn test_symbols_keep_netlist_order() {
        let drawing = render("GND\nV1 1 0 9\nR1 1 0 1k");
        let refs: Vec<&str> = drawing.symbols.iter().map(|s| s.reference.as_str()).collect();
        assert_eq!(refs, vec!["GND", "V1", "R1"]);
    }

    #[test]
    fn test_render_is_total() {
        for text in ["", "\u{0}", "hello world", "R", "M1 a b c d e f g", "0 0 0"] {
            let drawing = render(text);
            assert!(drawing.bounds.is_finite(), "{text:?}");
        }
    }

    #[test]
    fn test_custom_registry() {
        let mut renderer = Renderer::default();
        renderer.registry_mut().register(
            ComponentKind::Resistor,
            std::sync::Arc::new(crate::render::symbols::PlaceholderSymbol),
        );
        let drawing = renderer.render(&parse("R1 1 0 1k"));
        assert_eq!(drawing.symbols[0].symbol, "placeholder");
    }
}
