//! SVG serializer. Pure string building.

use std::fmt::Write;

use crate::export::theme::{Theme, ThemeColors};
use crate::export::ExportError;
use crate::parser::ComponentKind;
use crate::render::{
    Drawing, GroundMarker, Orientation, PathCmd, PlacedSymbol, Point, Primitive, TextAnchor,
};

const STROKE_WIDTH: f64 = 2.0;
const DOT_RADIUS: f64 = 3.5;
const OPEN_END_RADIUS: f64 = 3.0;
const FONT_SIZE: f64 = 11.0;
const LABEL_OFFSET: f64 = 6.0;

pub fn write_svg(drawing: &Drawing, theme: Theme) -> Result<String, ExportError> {
    validate(drawing)?;
    let colors = theme.colors();
    let bounds = drawing.bounds;
    let mut out = String::new();

    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="{x} {y} {w} {h}">"#,
        x = num(bounds.min_x),
        y = num(bounds.min_y),
        w = num(bounds.width()),
        h = num(bounds.height()),
    )?;
    writeln!(
        out,
        r#"<rect class="background" x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
        num(bounds.min_x),
        num(bounds.min_y),
        num(bounds.width()),
        num(bounds.height()),
        colors.background
    )?;
    writeln!(
        out,
        r#"<g stroke="{}" stroke-width="{}" fill="none" stroke-linecap="round" stroke-linejoin="round">"#,
        colors.stroke,
        num(STROKE_WIDTH)
    )?;

    writeln!(out, r#"<g class="wires">"#)?;
    for segment in &drawing.segments {
        let class = if segment.node.is_some() { "wire" } else { "stub" };
        write!(
            out,
            r#"<line class="{}" x1="{}" y1="{}" x2="{}" y2="{}""#,
            class,
            num(segment.from.x),
            num(segment.from.y),
            num(segment.to.x),
            num(segment.to.y)
        )?;
        if let Some(node) = &segment.node {
            write!(out, r#" data-node="{}""#, escape(node.as_str()))?;
        }
        writeln!(out, "/>")?;
    }
    writeln!(out, "</g>")?;

    for symbol in &drawing.symbols {
        write_symbol(&mut out, symbol, &colors)?;
    }
    for marker in &drawing.ground_markers {
        write_marker(&mut out, marker, &colors)?;
    }

    writeln!(out, r#"<g class="junctions" fill="{}">"#, colors.stroke)?;
    for point in &drawing.junctions {
        write_circle(&mut out, *point, DOT_RADIUS)?;
    }
    writeln!(out, "</g>")?;

    writeln!(out, r#"<g class="open-ends">"#)?;
    for point in &drawing.open_ends {
        write_circle(&mut out, *point, OPEN_END_RADIUS)?;
    }
    writeln!(out, "</g>")?;
    writeln!(out, "</g>")?;

    write_labels(&mut out, drawing, &colors)?;
    writeln!(out, "</svg>")?;
    Ok(out)
}

fn write_symbol(out: &mut String, symbol: &PlacedSymbol, colors: &ThemeColors) -> Result<(), ExportError> {
    writeln!(
        out,
        r#"<g class="symbol" data-ref="{}" data-symbol="{}" transform="{}">"#,
        escape(&symbol.reference),
        escape(&symbol.symbol),
        transform(symbol.origin, symbol.orientation)
    )?;
    for primitive in &symbol.primitives {
        write_primitive(out, primitive, colors)?;
    }
    writeln!(out, "</g>")?;
    Ok(())
}

fn write_marker(out: &mut String, marker: &GroundMarker, colors: &ThemeColors) -> Result<(), ExportError> {
    writeln!(
        out,
        r#"<g class="ground-marker" transform="{}">"#,
        transform(marker.origin, marker.orientation)
    )?;
    for primitive in &marker.primitives {
        write_primitive(out, primitive, colors)?;
    }
    writeln!(out, "</g>")?;
    Ok(())
}

fn write_primitive(out: &mut String, primitive: &Primitive, colors: &ThemeColors) -> Result<(), ExportError> {
    match primitive {
        Primitive::Path { cmds, filled } => {
            write!(out, r#"<path d="{}""#, path_data(cmds)?)?;
            if *filled {
                write!(out, r#" fill="{}""#, colors.stroke)?;
            }
            writeln!(out, "/>")?;
        }
        Primitive::Circle {
            center,
            radius,
            filled,
        } => {
            write!(
                out,
                r#"<circle cx="{}" cy="{}" r="{}""#,
                num(center.x),
                num(center.y),
                num(*radius)
            )?;
            if *filled {
                write!(out, r#" fill="{}""#, colors.stroke)?;
            }
            writeln!(out, "/>")?;
        }
        Primitive::Rect {
            origin,
            width,
            height,
        } => {
            writeln!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}"/>"#,
                num(origin.x),
                num(origin.y),
                num(*width),
                num(*height)
            )?;
        }
        Primitive::Text { at, text, anchor } => {
            writeln!(
                out,
                r#"<text x="{}" y="{}" text-anchor="{}" stroke="none" fill="{}" font-family="sans-serif" font-size="{}">{}</text>"#,
                num(at.x),
                num(at.y),
                anchor_name(*anchor),
                colors.text,
                num(FONT_SIZE),
                escape(text)
            )?;
        }
    }
    Ok(())
}

fn write_circle(out: &mut String, center: Point, radius: f64) -> Result<(), ExportError> {
    writeln!(
        out,
        r#"<circle cx="{}" cy="{}" r="{}"/>"#,
        num(center.x),
        num(center.y),
        num(radius)
    )?;
    Ok(())
}

fn write_labels(out: &mut String, drawing: &Drawing, colors: &ThemeColors) -> Result<(), ExportError> {
    writeln!(
        out,
        r#"<g class="labels" fill="{}" font-family="sans-serif" font-size="{}" text-anchor="middle">"#,
        colors.text,
        num(FONT_SIZE)
    )?;
    for symbol in &drawing.symbols {
        if symbol.kind == ComponentKind::Ground {
            continue;
        }
        let extent = symbol.extent();
        let x = (extent.min_x + extent.max_x) / 2.0;
        writeln!(
            out,
            r#"<text class="reference" x="{}" y="{}">{}</text>"#,
            num(x),
            num(extent.min_y - LABEL_OFFSET),
            escape(&symbol.reference)
        )?;
        if let Some(label) = &symbol.label {
            writeln!(
                out,
                r#"<text class="value" x="{}" y="{}">{}</text>"#,
                num(x),
                num(extent.max_y + LABEL_OFFSET + FONT_SIZE),
                escape(label)
            )?;
        }
    }
    writeln!(out, "</g>")?;
    Ok(())
}

fn path_data(cmds: &[PathCmd]) -> Result<String, ExportError> {
    let mut d = String::new();
    for cmd in cmds {
        if !d.is_empty() {
            d.push(' ');
        }
        match cmd {
            PathCmd::MoveTo(x, y) => write!(d, "M{} {}", num(*x), num(*y))?,
            PathCmd::LineTo(x, y) => write!(d, "L{} {}", num(*x), num(*y))?,
            PathCmd::ArcTo {
                x,
                y,
                radius,
                sweep,
            } => write!(
                d,
                "A{r} {r} 0 0 {s} {} {}",
                num(*x),
                num(*y),
                r = num(*radius),
                s = u8::from(*sweep)
            )?,
            PathCmd::Close => d.push('Z'),
        }
    }
    Ok(d)
}

fn transform(origin: Point, orientation: Orientation) -> String {
    match orientation.degrees() {
        0 => format!("translate({} {})", num(origin.x), num(origin.y)),
        degrees => format!(
            "translate({} {}) rotate({})",
            num(origin.x),
            num(origin.y),
            degrees
        ),
    }
}

fn anchor_name(anchor: TextAnchor) -> &'static str {
    match anchor {
        TextAnchor::Start => "start",
        TextAnchor::Middle => "middle",
        TextAnchor::End => "end",
    }
}

/// Compact number formatting: at most two decimals, no trailing zeros.
fn num(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // Not representable in XML 1.0.
            c if c.is_control() && !matches!(c, '\t' | '\n' | '\r') => escaped.push('\u{fffd}'),
            c => escaped.push(c),
        }
    }
    escaped
}

fn validate(drawing: &Drawing) -> Result<(), ExportError> {
    let invalid = |what: String| Err(ExportError::InvalidGeometry(what));

    if !drawing.bounds.is_finite() || drawing.bounds.width() < 0.0 || drawing.bounds.height() < 0.0 {
        return invalid("drawing bounds".to_string());
    }
    for symbol in &drawing.symbols {
        if !symbol.origin.is_finite()
            || !symbol.primitives.iter().all(Primitive::is_finite)
            || !symbol.terminals.iter().all(|t| t.point.is_finite())
        {
            return invalid(format!("symbol {}", symbol.reference));
        }
    }
    if let Some(segment) = drawing
        .segments
        .iter()
        .find(|s| !s.from.is_finite() || !s.to.is_finite())
    {
        let node = segment.node.as_ref().map_or("stub", |n| n.as_str());
        return invalid(format!("segment on node {}", node));
    }
    if drawing
        .junctions
        .iter()
        .chain(&drawing.open_ends)
        .any(|p| !p.is_finite())
    {
        return invalid("connection dot".to_string());
    }
    if drawing
        .ground_markers
        .iter()
        .any(|m| !m.origin.is_finite() || !m.primitives.iter().all(Primitive::is_finite))
    {
        return invalid("ground marker".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_formatting() {
        assert_eq!(num(30.0), "30");
        assert_eq!(num(-7.5), "-7.5");
        assert_eq!(num(0.333), "0.33");
        assert_eq!(num(-0.001), "0");
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("R<1>&\"'"), "R&lt;1&gt;&amp;&quot;&apos;");
        assert_eq!(escape("a\u{1}b"), "a\u{fffd}b");
        assert_eq!(escape("4.7kΩ"), "4.7kΩ");
    }

    #[test]
    fn test_path_data() {
        let d = path_data(&[
            PathCmd::MoveTo(-30.0, 0.0),
            PathCmd::ArcTo {
                x: -10.0,
                y: 0.0,
                radius: 5.0,
                sweep: true,
            },
            PathCmd::Close,
        ])
        .unwrap();
        assert_eq!(d, "M-30 0 A5 5 0 0 1 -10 0 Z");
    }

    #[test]
    fn test_transform() {
        assert_eq!(
            transform(Point::new(1.0, 2.0), Orientation::Right),
            "translate(1 2)"
        );
        assert_eq!(
            transform(Point::new(1.0, 2.0), Orientation::Down),
            "translate(1 2) rotate(90)"
        );
    }
}
