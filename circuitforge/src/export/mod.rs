//! SVG export of rendered drawings.
//!
//! Two themes share one serializer and differ only in colors: the display
//! theme draws light strokes on a transparent background for dark
//! interfaces, the download theme draws black on white.

pub mod svg;
pub mod theme;

use std::path::Path;

use crate::render::Drawing;

pub use theme::{Theme, ThemeColors};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Formatting error: {0}")]
    Format(#[from] std::fmt::Error),
    #[error("Invalid geometry in {0}")]
    InvalidGeometry(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Export with the download theme.
pub fn export(drawing: &Drawing) -> Result<Vec<u8>, ExportError> {
    export_with_theme(drawing, Theme::Download)
}

pub fn export_with_theme(drawing: &Drawing, theme: Theme) -> Result<Vec<u8>, ExportError> {
    to_svg_string(drawing, theme).map(String::into_bytes)
}

pub fn to_svg_string(drawing: &Drawing, theme: Theme) -> Result<String, ExportError> {
    svg::write_svg(drawing, theme)
}

/// Write the SVG for `drawing` to `path`.
pub fn export_to_file(drawing: &Drawing, theme: Theme, path: &Path) -> Result<(), ExportError> {
    let bytes = export_with_theme(drawing, theme)?;
    std::fs::write(path, bytes)?;
    tracing::info!("Wrote {} schematic to {}", theme, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::render::{render, Point};

    fn svg(text: &str, theme: Theme) -> String {
        to_svg_string(&render(&parse(text)), theme).unwrap()
    }

    #[test]
    fn test_one_group_per_symbol() {
        let out = svg("V1 1 0 9V\nR1 1 0 1k\nX1 1 0 foo", Theme::Download);
        assert!(out.starts_with("<?xml"));
        assert!(out.trim_end().ends_with("</svg>"));
        assert_eq!(out.matches(r#"class="symbol""#).count(), 3);
        assert!(out.contains(r#"data-ref="X1" data-symbol="placeholder""#));
        assert_eq!(out.matches("<g").count(), out.matches("</g>").count());
    }

    #[test]
    fn test_themes_differ_only_in_colors() {
        let text = "V1 1 0 9V\nR1 1 2 1k\nC1 2 0 10u\nD1 2 0 D1N4148";
        let display = svg(text, Theme::Display);
        let download = svg(text, Theme::Download);
        assert_ne!(display, download);
        assert!(display.contains("#fafafa"));
        assert!(!display.contains("#000000"));
        let recolored = display.replace("#fafafa", "#000000").replace("transparent", "#ffffff");
        assert_eq!(recolored, download);
    }

    #[test]
    fn test_labels_are_escaped() {
        let out = svg("R<1> 1 0 1k", Theme::Download);
        assert!(out.contains("R&lt;1&gt;"));
        assert!(!out.contains("R<1>"));
    }

    #[test]
    fn test_value_labels() {
        let out = svg("V1 1 0 9V\nR1 1 0 1k", Theme::Download);
        assert!(out.contains(">9V</text>"));
        assert!(out.contains(">1kΩ</text>"));
    }

    #[test]
    fn test_export_bytes_match_download_theme() {
        let drawing = render(&parse("V1 1 0 9\nR1 1 0 1k"));
        let bytes = export(&drawing).unwrap();
        assert_eq!(bytes, to_svg_string(&drawing, Theme::Download).unwrap().into_bytes());
    }

    #[test]
    fn test_empty_drawing_exports() {
        let out = svg("", Theme::Download);
        assert_eq!(out.matches(r#"class="symbol""#).count(), 0);
    }

    #[test]
    fn test_non_finite_geometry_is_rejected() {
        let mut drawing = render(&parse("R1 1 0 1k"));
        drawing.symbols[0].origin = Point::new(f64::NAN, 0.0);
        assert!(matches!(export(&drawing), Err(ExportError::InvalidGeometry(_))));

        let mut drawing = render(&parse("R1 1 0 1k"));
        drawing.bounds.max_x = f64::INFINITY;
        assert!(matches!(export(&drawing), Err(ExportError::InvalidGeometry(_))));
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.svg");
        let drawing = render(&parse("V1 1 0 9\nR1 1 0 1k"));
        export_to_file(&drawing, Theme::Display, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("#fafafa"));
    }
}
