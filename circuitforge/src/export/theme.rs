use serde::{Deserialize, Serialize};
use std::fmt;

/// Color scheme of an exported schematic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Light strokes on a transparent background, for dark interfaces
    Display,
    /// Black on white, for files
    #[default]
    Download,
}

/// Concrete colors of a [`Theme`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeColors {
    pub stroke: &'static str,
    pub text: &'static str,
    pub background: &'static str,
}

impl Theme {
    pub fn colors(&self) -> ThemeColors {
        match self {
            Theme::Display => ThemeColors {
                stroke: "#fafafa",
                text: "#fafafa",
                background: "transparent",
            },
            Theme::Download => ThemeColors {
                stroke: "#000000",
                text: "#000000",
                background: "#ffffff",
            },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Theme::Display => "display",
            Theme::Download => "download",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
