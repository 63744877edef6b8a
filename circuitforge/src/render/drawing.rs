//! Output types of the schematic renderer.
//!
//! A [`Drawing`] is plain geometry in an abstract unit space (one unit maps
//! to one SVG user unit). Symbol primitives are stored in the symbol's local
//! frame; [`PlacedSymbol::origin`] and [`Orientation`] place them on the
//! canvas. Everything else is already in canvas coordinates.

use serde::{Deserialize, Serialize};

use crate::parser::{ComponentKind, NodeId};

/// Point in layout space. `y` grows downwards, as in SVG.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A path command in a symbol's local frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathCmd {
    /// Move to (x, y) without drawing.
    MoveTo(f64, f64),
    /// Draw a line to (x, y).
    LineTo(f64, f64),
    /// Circular arc to (x, y) with the given radius; `sweep` follows the SVG
    /// sweep flag (true = clockwise on screen).
    ArcTo { x: f64, y: f64, radius: f64, sweep: bool },
    /// Close the current sub-path.
    Close,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// Drawing primitive of a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    Path { cmds: Vec<PathCmd>, filled: bool },
    Circle { center: Point, radius: f64, filled: bool },
    Rect { origin: Point, width: f64, height: f64 },
    Text { at: Point, text: String, anchor: TextAnchor },
}

impl Primitive {
    pub fn path(cmds: Vec<PathCmd>) -> Self {
        Primitive::Path { cmds, filled: false }
    }

    pub fn filled_path(cmds: Vec<PathCmd>) -> Self {
        Primitive::Path { cmds, filled: true }
    }

    /// Every coordinate and length is a finite number
    pub fn is_finite(&self) -> bool {
        match self {
            Primitive::Path { cmds, .. } => cmds.iter().all(|cmd| match cmd {
                PathCmd::MoveTo(x, y) | PathCmd::LineTo(x, y) => x.is_finite() && y.is_finite(),
                PathCmd::ArcTo { x, y, radius, .. } => {
                    x.is_finite() && y.is_finite() && radius.is_finite()
                }
                PathCmd::Close => true,
            }),
            Primitive::Circle { center, radius, .. } => center.is_finite() && radius.is_finite(),
            Primitive::Rect {
                origin,
                width,
                height,
            } => origin.is_finite() && width.is_finite() && height.is_finite(),
            Primitive::Text { at, .. } => at.is_finite(),
        }
    }
}

/// Rotation applied to a symbol's local frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// As drawn: first terminal on the left
    #[default]
    Right,
    /// Rotated a half turn: first terminal on the right
    Left,
    /// Rotated a quarter turn clockwise: first terminal on top
    Down,
}

impl Orientation {
    /// Map a local point into the rotated frame
    pub fn apply(&self, p: Point) -> Point {
        match self {
            Orientation::Right => p,
            Orientation::Left => Point::new(-p.x, -p.y),
            Orientation::Down => Point::new(-p.y, p.x),
        }
    }

    /// Rotation in degrees, as used by SVG `rotate()`
    pub fn degrees(&self) -> u16 {
        match self {
            Orientation::Right => 0,
            Orientation::Left => 180,
            Orientation::Down => 90,
        }
    }
}

/// A connection point of a placed symbol, in canvas coordinates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub point: Point,
    /// `None` when the record has no node for this terminal
    pub node: Option<NodeId>,
    /// Drawn as an unconnected stub
    pub dangling: bool,
}

/// One component record placed on the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedSymbol {
    pub reference: String,
    pub kind: ComponentKind,
    /// Name of the symbol strategy that drew it
    pub symbol: String,
    /// Value or model text shown under the symbol
    pub label: Option<String>,
    pub origin: Point,
    pub orientation: Orientation,
    pub width: f64,
    pub height: f64,
    /// Primitives in the symbol's local frame
    pub primitives: Vec<Primitive>,
    pub terminals: Vec<Terminal>,
    /// Netlist line the record came from
    pub line: usize,
}

impl PlacedSymbol {
    /// Canvas-space bounding box after rotation
    pub fn extent(&self) -> Bounds {
        let (w, h) = match self.orientation {
            Orientation::Down => (self.height, self.width),
            _ => (self.width, self.height),
        };
        Bounds::new(
            self.origin.x - w / 2.0,
            self.origin.y - h / 2.0,
            self.origin.x + w / 2.0,
            self.origin.y + h / 2.0,
        )
    }
}

/// A straight connecting line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
    /// Node the line belongs to; `None` for dangling stubs
    pub node: Option<NodeId>,
}

/// Ground symbol added for node `0`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundMarker {
    pub origin: Point,
    pub orientation: Orientation,
    pub primitives: Vec<Primitive>,
}

/// Axis-aligned canvas rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub const fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn around(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }

    pub fn include(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    pub fn merge(&mut self, other: &Bounds) {
        self.include(Point::new(other.min_x, other.min_y));
        self.include(Point::new(other.max_x, other.max_y));
    }

    pub fn pad(&self, margin: f64) -> Self {
        Self::new(
            self.min_x - margin,
            self.min_y - margin,
            self.max_x + margin,
            self.max_y + margin,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}

/// Complete schematic, the output of [`crate::render::render`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    /// One entry per netlist record, in netlist order
    pub symbols: Vec<PlacedSymbol>,
    pub segments: Vec<Segment>,
    /// Dots where three or more terminals meet
    pub junctions: Vec<Point>,
    /// Open circles at the end of dangling stubs
    pub open_ends: Vec<Point>,
    pub ground_markers: Vec<GroundMarker>,
    pub bounds: Bounds,
}

impl Drawing {
    pub fn symbol(&self, reference: &str) -> Option<&PlacedSymbol> {
        self.symbols.iter().find(|s| s.reference == reference)
    }

    /// Segments drawn for `node`
    pub fn segments_on<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments
            .iter()
            .filter(move |s| s.node.as_ref() == Some(node))
    }

    pub fn dangling_count(&self) -> usize {
        self.symbols
            .iter()
            .flat_map(|s| s.terminals.iter())
            .filter(|t| t.dangling)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_apply() {
        let p = Point::new(-15.0, 0.0);
        assert_eq!(Orientation::Right.apply(p), p);
        assert_eq!(Orientation::Left.apply(p), Point::new(15.0, 0.0));
        assert_eq!(Orientation::Down.apply(p), Point::new(0.0, -15.0));
    }

    #[test]
    fn test_bounds_include_and_pad() {
        let mut bounds = Bounds::around(Point::new(0.0, 0.0));
        bounds.include(Point::new(10.0, -5.0));
        bounds.include(Point::new(-2.0, 8.0));
        assert_eq!(bounds, Bounds::new(-2.0, -5.0, 10.0, 8.0));
        let padded = bounds.pad(1.0);
        assert_eq!(padded.width(), 14.0);
        assert_eq!(padded.height(), 15.0);
    }

    #[test]
    fn test_primitive_finiteness() {
        assert!(Primitive::path(vec![PathCmd::MoveTo(0.0, 0.0), PathCmd::Close]).is_finite());
        assert!(!Primitive::Circle {
            center: Point::new(f64::NAN, 0.0),
            radius: 1.0,
            filled: false
        }
        .is_finite());
    }
}
