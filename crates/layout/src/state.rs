//! Page geometry requested for a stretch of content.

use galley_style::lenient_length;
use galley_types::{Margins, Rect, Size};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Dimensions or margins closer than this are treated as the same layout.
pub const LAYOUT_TOLERANCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }

    fn of(width: f32, height: f32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "portrait" => Ok(Orientation::Portrait),
            "landscape" => Ok(Orientation::Landscape),
            other => Err(format!("unknown orientation '{}'", other)),
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully specified page geometry. Width and height always agree with the
/// orientation: `width <= height` for portrait, `width >= height` for landscape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutState {
    pub orientation: Orientation,
    pub width: f32,
    pub height: f32,
    pub margins: Margins,
}

impl Default for LayoutState {
    /// US Letter portrait with one-inch margins.
    fn default() -> Self {
        Self {
            orientation: Orientation::Portrait,
            width: 612.0,
            height: 792.0,
            margins: Margins::all(72.0),
        }
    }
}

impl LayoutState {
    pub fn new(orientation: Orientation, width: f32, height: f32, margins: Margins) -> Self {
        Self {
            orientation,
            width,
            height,
            margins,
        }
        .normalized()
    }

    /// Swaps width and height when they contradict the orientation.
    pub fn normalized(mut self) -> Self {
        let swap = match self.orientation {
            Orientation::Portrait => self.width > self.height,
            Orientation::Landscape => self.width < self.height,
        };
        if swap {
            std::mem::swap(&mut self.width, &mut self.height);
        }
        self
    }

    /// The state a page already has, orientation read from its dimensions.
    pub fn from_page(bounds: Rect, margins: Margins) -> Self {
        let orientation = if bounds.width > bounds.height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        };
        Self {
            orientation,
            width: bounds.width,
            height: bounds.height,
            margins,
        }
    }

    pub fn page_size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// The writable area of a page laid out with this state.
    pub fn margin_box(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height).inset(&self.margins)
    }
}

/// True when orientations match and every dimension and margin differs by
/// at most [`LAYOUT_TOLERANCE`].
pub fn states_equal(a: &LayoutState, b: &LayoutState) -> bool {
    let close = |x: f32, y: f32| (x - y).abs() <= LAYOUT_TOLERANCE;
    a.orientation == b.orientation
        && close(a.width, b.width)
        && close(a.height, b.height)
        && close(a.margins.top, b.margins.top)
        && close(a.margins.bottom, b.margins.bottom)
        && close(a.margins.left, b.margins.left)
        && close(a.margins.right, b.margins.right)
}

/// A layout request in which every field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialLayout {
    pub orientation: Option<Orientation>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub margin_top: Option<f32>,
    pub margin_bottom: Option<f32>,
    pub margin_left: Option<f32>,
    pub margin_right: Option<f32>,
}

fn number(value: Option<&Value>) -> Option<f32> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64().map(|v| v as f32),
        Value::String(s) => lenient_length(s),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

impl PartialLayout {
    /// Reads a layout from loosely typed JSON.
    ///
    /// Numbers may be JSON numbers or length strings (`"8.5in"`); anything
    /// unparseable or non-finite is left out. Margins can be given as a
    /// `margins` object or as `marginTop`-style keys.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        let get = |keys: &[&str]| keys.iter().find_map(|k| number(obj.get(*k)));
        let margins = obj.get("margins").and_then(Value::as_object);
        let margin = |side: &str, flat: &str| {
            margins
                .and_then(|m| number(m.get(side)))
                .or_else(|| number(obj.get(flat)))
        };

        Self {
            orientation: obj
                .get("orientation")
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            width: get(&["width", "widthPt", "pageWidth"]),
            height: get(&["height", "heightPt", "pageHeight"]),
            margin_top: margin("top", "marginTop"),
            margin_bottom: margin("bottom", "marginBottom"),
            margin_left: margin("left", "marginLeft"),
            margin_right: margin("right", "marginRight"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fills missing fields from `base` and orients the result.
    ///
    /// Without an explicit orientation, explicit dimensions decide it; with
    /// neither, `base` does.
    pub fn resolve(&self, base: &LayoutState) -> LayoutState {
        let orientation = self.orientation.unwrap_or(match (self.width, self.height) {
            (Some(w), Some(h)) => Orientation::of(w, h),
            _ => base.orientation,
        });
        LayoutState {
            orientation,
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
            margins: Margins {
                top: self.margin_top.unwrap_or(base.margins.top),
                bottom: self.margin_bottom.unwrap_or(base.margins.bottom),
                left: self.margin_left.unwrap_or(base.margins.left),
                right: self.margin_right.unwrap_or(base.margins.right),
            },
        }
        .normalized()
    }
}

impl From<LayoutState> for PartialLayout {
    fn from(state: LayoutState) -> Self {
        Self {
            orientation: Some(state.orientation),
            width: Some(state.width),
            height: Some(state.height),
            margin_top: Some(state.margins.top),
            margin_bottom: Some(state.margins.bottom),
            margin_left: Some(state.margins.left),
            margin_right: Some(state.margins.right),
        }
    }
}

impl<'de> Deserialize<'de> for PartialLayout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}
