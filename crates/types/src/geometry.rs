use serde::{Deserialize, Serialize};

/// Tolerance used when comparing geometry that went through a host round trip.
pub const GEOMETRY_EPSILON: f32 = 0.01;

/// An axis-aligned rectangle in points. `y` grows downwards, so `top() < bottom()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Builds a rectangle from host-style bounds `[top, left, bottom, right]`.
    pub fn from_bounds(top: f32, left: f32, bottom: f32, right: f32) -> Self {
        Self {
            x: left,
            y: top,
            width: (right - left).max(0.0),
            height: (bottom - top).max(0.0),
        }
    }

    /// Returns `[top, left, bottom, right]`.
    pub fn to_bounds(self) -> [f32; 4] {
        [self.top(), self.left(), self.bottom(), self.right()]
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Shrinks the rectangle by the given margins. Never produces a negative size.
    pub fn inset(&self, margins: &Margins) -> Rect {
        Rect {
            x: self.x + margins.left,
            y: self.y + margins.top,
            width: (self.width - margins.left - margins.right).max(0.0),
            height: (self.height - margins.top - margins.bottom).max(0.0),
        }
    }

    pub fn contains(&self, other: &Rect) -> bool {
        other.left() >= self.left() - GEOMETRY_EPSILON
            && other.top() >= self.top() - GEOMETRY_EPSILON
            && other.right() <= self.right() + GEOMETRY_EPSILON
            && other.bottom() <= self.bottom() + GEOMETRY_EPSILON
    }

    pub fn approx_eq(&self, other: &Rect) -> bool {
        (self.x - other.x).abs() < GEOMETRY_EPSILON
            && (self.y - other.y).abs() < GEOMETRY_EPSILON
            && (self.width - other.width).abs() < GEOMETRY_EPSILON
            && (self.height - other.height).abs() < GEOMETRY_EPSILON
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn zero() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
        }
    }

    /// Width over height, or `None` for a degenerate size.
    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.width > 0.0 && self.height > 0.0 {
            Some(self.width / self.height)
        } else {
            None
        }
    }

    /// Scales the size down (never up) so that it fits inside `max`, keeping the aspect ratio.
    pub fn fit_within(self, max: Size) -> Size {
        let mut scale: f32 = 1.0;
        if self.width > max.width && self.width > 0.0 {
            scale = scale.min(max.width / self.width);
        }
        if self.height > max.height && self.height > 0.0 {
            scale = scale.min(max.height / self.height);
        }
        Size::new(self.width * scale, self.height * scale)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub fn all(value: f32) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    pub fn zero() -> Self {
        Self::all(0.0)
    }

    pub fn horizontal(&self) -> f32 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f32 {
        self.top + self.bottom
    }
}
