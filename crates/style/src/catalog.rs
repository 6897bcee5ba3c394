//! Named paragraph and character styles supplied by the template.
//!
//! Names are matched ignoring whitespace and case, and lookups descend into
//! nested style groups. Missing styles are created on demand from the default
//! style so a run never stops on an unknown name.

use crate::text::TextAlign;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PARAGRAPH_STYLE: &str = "[Basic Paragraph]";
pub const DEFAULT_CHARACTER_STYLE: &str = "[None]";

/// Collapses a style name to its lookup key: whitespace removed, lowercased.
pub fn normalize_style_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

pub trait NamedStyle: Clone {
    fn name(&self) -> &str;
    /// Builds a new style called `name`, inheriting from `base` when one exists.
    fn derive_from(name: &str, base: Option<&Self>) -> Self;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParagraphStyle {
    pub name: String,
    pub point_size: f32,
    /// Absolute leading in points; `None` means auto (120% of the point size).
    pub leading: Option<f32>,
    pub space_before: f32,
    pub space_after: f32,
    pub align: TextAlign,
}

impl Default for ParagraphStyle {
    fn default() -> Self {
        Self {
            name: DEFAULT_PARAGRAPH_STYLE.to_string(),
            point_size: 12.0,
            leading: None,
            space_before: 0.0,
            space_after: 0.0,
            align: TextAlign::Left,
        }
    }
}

impl ParagraphStyle {
    pub fn leading_pt(&self) -> f32 {
        self.leading.unwrap_or(self.point_size * 1.2)
    }
}

impl NamedStyle for ParagraphStyle {
    fn name(&self) -> &str {
        &self.name
    }

    fn derive_from(name: &str, base: Option<&Self>) -> Self {
        Self {
            name: name.to_string(),
            ..base.cloned().unwrap_or_default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CharacterStyle {
    pub name: String,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub point_size: Option<f32>,
}

impl NamedStyle for CharacterStyle {
    fn name(&self) -> &str {
        &self.name
    }

    fn derive_from(name: &str, _base: Option<&Self>) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// A named folder of styles, possibly containing further groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleGroup<T> {
    #[serde(default)]
    pub name: String,
    #[serde(default = "Vec::new")]
    pub styles: Vec<T>,
    #[serde(default = "Vec::new")]
    pub groups: Vec<StyleGroup<T>>,
}

impl<T> Default for StyleGroup<T> {
    fn default() -> Self {
        Self {
            name: String::new(),
            styles: Vec::new(),
            groups: Vec::new(),
        }
    }
}

impl<T: NamedStyle> StyleGroup<T> {
    /// Depth-first search by normalized key. Direct members win over nested groups.
    pub fn find(&self, key: &str) -> Option<&T> {
        self.styles
            .iter()
            .find(|s| normalize_style_name(s.name()) == key)
            .or_else(|| self.groups.iter().find_map(|g| g.find(key)))
    }

    pub fn len(&self) -> usize {
        self.styles.len() + self.groups.iter().map(StyleGroup::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StyleCatalog {
    pub paragraph: StyleGroup<ParagraphStyle>,
    pub character: StyleGroup<CharacterStyle>,
}

impl StyleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_paragraph(&self, name: &str) -> Option<&ParagraphStyle> {
        self.paragraph.find(&normalize_style_name(name))
    }

    pub fn find_character(&self, name: &str) -> Option<&CharacterStyle> {
        self.character.find(&normalize_style_name(name))
    }

    /// The template's default paragraph style, or the built-in one.
    pub fn default_paragraph(&self) -> ParagraphStyle {
        self.find_paragraph(DEFAULT_PARAGRAPH_STYLE)
            .cloned()
            .unwrap_or_default()
    }

    /// Resolves a paragraph style, creating it from the default style when absent.
    pub fn paragraph_style(&mut self, name: &str) -> ParagraphStyle {
        if let Some(found) = self.find_paragraph(name) {
            return found.clone();
        }
        let base = self.default_paragraph();
        let created = ParagraphStyle::derive_from(name.trim(), Some(&base));
        log::debug!("Paragraph style '{}' not found, created from default.", name);
        self.paragraph.styles.push(created.clone());
        created
    }

    /// Resolves a character style, creating an empty one when absent.
    pub fn character_style(&mut self, name: &str) -> CharacterStyle {
        if let Some(found) = self.find_character(name) {
            return found.clone();
        }
        let created = CharacterStyle::derive_from(name.trim(), None);
        log::debug!("Character style '{}' not found, created empty.", name);
        self.character.styles.push(created.clone());
        created
    }
}
