use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Horizontal alignment for paragraphs, table cells and inline graphics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl FromStr for TextAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "start" => Ok(TextAlign::Left),
            "center" | "centre" | "middle" => Ok(TextAlign::Center),
            "right" | "end" => Ok(TextAlign::Right),
            "justify" | "both" => Ok(TextAlign::Justify),
            other => Err(format!("Unknown horizontal alignment: {}", other)),
        }
    }
}

/// Vertical alignment of content inside a table cell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalAlign {
    #[default]
    Top,
    Center,
    Bottom,
}

impl FromStr for VerticalAlign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(VerticalAlign::Top),
            "center" | "centre" | "middle" => Ok(VerticalAlign::Center),
            "bottom" => Ok(VerticalAlign::Bottom),
            other => Err(format!("Unknown vertical alignment: {}", other)),
        }
    }
}
