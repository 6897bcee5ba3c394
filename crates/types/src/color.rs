use serde::{de, Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// An RGB swatch used for table strokes and cell shading.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };
    pub const WHITE: Color = Color { r: 255, g: 255, b: 255 };

    pub fn gray(value: u8) -> Self {
        Self {
            r: value,
            g: value,
            b: value,
        }
    }

    fn named(name: &str) -> Option<Color> {
        match name {
            "black" => Some(Color::BLACK),
            "white" | "paper" => Some(Color::WHITE),
            "gray" | "grey" => Some(Color::gray(128)),
            "lightgray" | "lightgrey" => Some(Color::gray(211)),
            "red" => Some(Color { r: 255, g: 0, b: 0 }),
            "green" => Some(Color { r: 0, g: 128, b: 0 }),
            "blue" => Some(Color { r: 0, g: 0, b: 255 }),
            _ => None,
        }
    }

    fn parse_hex(hex: &str) -> Result<Color, String> {
        let channel = |s: &str| {
            u8::from_str_radix(s, 16).map_err(|e| format!("Invalid colour channel '{}': {}", s, e))
        };
        match hex.len() {
            3 => Ok(Color {
                r: channel(&hex[0..1].repeat(2))?,
                g: channel(&hex[1..2].repeat(2))?,
                b: channel(&hex[2..3].repeat(2))?,
            }),
            6 => Ok(Color {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            n => Err(format!("Invalid hex colour length: expected 3 or 6, got {}", n)),
        }
    }
}

impl FromStr for Color {
    type Err = String;

    /// Accepts `#RGB`, `#RRGGBB` or a small set of swatch names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            return Self::parse_hex(hex);
        }
        Self::named(&s.to_ascii_lowercase()).ok_or_else(|| format!("Unknown colour: {}", s))
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum ColorDef {
            Str(String),
            Map { r: u8, g: u8, b: u8 },
        }

        match ColorDef::deserialize(deserializer)? {
            ColorDef::Str(s) => s.parse().map_err(de::Error::custom),
            ColorDef::Map { r, g, b } => Ok(Color { r, g, b }),
        }
    }
}
