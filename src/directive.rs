//! The content stream a run composes.

use crate::error::PipelineError;
use galley_layout::{FloatSpec, InlineStyle, LayoutError, PartialLayout, TableSpec};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

fn yes() -> bool {
    true
}

/// Image attributes, either as a `key=value` string or as an object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ImageAttrs {
    Inline(String),
    Map(BTreeMap<String, Value>),
}

impl ImageAttrs {
    pub fn to_spec(&self) -> Result<FloatSpec, LayoutError> {
        match self {
            ImageAttrs::Inline(attrs) => FloatSpec::from_attrs(attrs),
            ImageAttrs::Map(map) => FloatSpec::from_pairs(map.iter().map(|(k, v)| {
                let value = match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (k.as_str(), value)
            })),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Directive {
    Text {
        text: String,
    },
    /// Ends the paragraph; `style` applies to the next one.
    Paragraph {
        #[serde(default)]
        style: Option<String>,
    },
    /// Styles the current paragraph.
    ParagraphStyle {
        style: String,
    },
    Format {
        style: InlineStyle,
        #[serde(default = "yes")]
        on: bool,
    },
    CharStyle {
        #[serde(default)]
        style: Option<String>,
    },
    Image {
        attrs: ImageAttrs,
    },
    Table(TableSpec),
    Footnote {
        id: u32,
        content: String,
    },
    Endnote {
        id: u32,
        content: String,
    },
    Layout(PartialLayout),
    PageBreak,
    FrameBreak,
    ColumnBreak,
}

impl Directive {
    pub fn kind(&self) -> &'static str {
        match self {
            Directive::Text { .. } => "text",
            Directive::Paragraph { .. } => "paragraph",
            Directive::ParagraphStyle { .. } => "paragraphStyle",
            Directive::Format { .. } => "format",
            Directive::CharStyle { .. } => "charStyle",
            Directive::Image { .. } => "image",
            Directive::Table(_) => "table",
            Directive::Footnote { .. } => "footnote",
            Directive::Endnote { .. } => "endnote",
            Directive::Layout(_) => "layout",
            Directive::PageBreak => "pageBreak",
            Directive::FrameBreak => "frameBreak",
            Directive::ColumnBreak => "columnBreak",
        }
    }
}

pub fn parse_directives(source: &str) -> Result<Vec<Directive>, PipelineError> {
    Ok(serde_json::from_str(source)?)
}

pub fn load_directives<P: AsRef<Path>>(path: P) -> Result<Vec<Directive>, PipelineError> {
    let source = fs::read_to_string(path.as_ref())?;
    parse_directives(&source)
}
