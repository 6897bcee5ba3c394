//! Float directives: where an image goes and how big it is.

use crate::LayoutError;
use galley_style::{Dimension, VerticalAlign, lenient_length, parse_attributes, parse_dimension_str};
use galley_traits::WrapMode;
use galley_types::{Margins, Size};

/// The frame a float position is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefArea {
    Page,
    PageArea,
    PageEdge,
    Margin,
    Spread,
    Paragraph,
    Column,
    Character,
}

impl RefArea {
    pub fn parse(value: &str) -> Option<Self> {
        let key: String = value
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        Some(match key.as_str() {
            "page" => RefArea::Page,
            "pagearea" => RefArea::PageArea,
            "pageedge" => RefArea::PageEdge,
            "margin" => RefArea::Margin,
            "spread" => RefArea::Spread,
            "paragraph" | "text" => RefArea::Paragraph,
            "column" => RefArea::Column,
            "character" | "char" | "line" => RefArea::Character,
            _ => return None,
        })
    }

    /// Reference areas that pin a float to the page rather than to text.
    pub fn is_page_level(self) -> bool {
        matches!(
            self,
            RefArea::Page | RefArea::PageArea | RefArea::PageEdge | RefArea::Margin | RefArea::Spread
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HorizontalAlign {
    #[default]
    Left,
    Center,
    Right,
}

impl HorizontalAlign {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "left" | "inside" => Some(HorizontalAlign::Left),
            "center" | "centre" | "middle" => Some(HorizontalAlign::Center),
            "right" | "outside" => Some(HorizontalAlign::Right),
            _ => None,
        }
    }

    /// Offset of an item of `item` width inside `available`.
    pub fn offset(self, available: f32, item: f32) -> f32 {
        match self {
            HorizontalAlign::Left => 0.0,
            HorizontalAlign::Center => (available - item) / 2.0,
            HorizontalAlign::Right => available - item,
        }
    }
}

fn parse_wrap(value: &str) -> Option<WrapMode> {
    let key: String = value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect();
    match key.as_str() {
        "none" | "inline" => Some(WrapMode::None),
        "square" | "wrapsquare" | "bounding" => Some(WrapMode::Square),
        "tight" | "through" => Some(WrapMode::Tight),
        "topbottom" | "topandbottom" | "jump" => Some(WrapMode::TopBottom),
        "behind" | "behindtext" => Some(WrapMode::Behind),
        "front" | "infront" | "infrontoftext" => Some(WrapMode::Front),
        _ => None,
    }
}

/// A parsed image directive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FloatSpec {
    pub src: String,
    pub width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub pos_href: Option<RefArea>,
    pub pos_vref: Option<RefArea>,
    pub pos_h: Option<HorizontalAlign>,
    pub pos_v: Option<VerticalAlign>,
    pub off_x: f32,
    pub off_y: f32,
    pub wrap: WrapMode,
    /// Stand-off distances; also used as guards when clamping to the page.
    pub dist: Margins,
    /// Page number of the image in the originating source document.
    pub word_page_seq: Option<u32>,
    /// Page size of the originating source document, for offset scaling.
    pub source_page: Option<Size>,
    /// Horizontal alignment for inline placement.
    pub align: Option<HorizontalAlign>,
}

impl FloatSpec {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            ..Default::default()
        }
    }

    /// Parses a `key=value` attribute string such as
    /// `src="fig.png" w=100pt posHref=page offX=12`.
    pub fn from_attrs(attrs: &str) -> Result<Self, LayoutError> {
        let pairs = parse_attributes(attrs).map_err(|e| LayoutError::InvalidSpec(e.to_string()))?;
        Self::from_pairs(pairs)
    }

    /// Builds a spec from already split attributes. Keys are case-insensitive;
    /// unparseable values are dropped with a warning.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, LayoutError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut spec = FloatSpec::default();
        let mut source_w = None;
        let mut source_h = None;

        for (key, value) in pairs {
            let key = key.as_ref().to_ascii_lowercase();
            let value = value.as_ref().trim();
            let parsed = match key.as_str() {
                "src" | "href" | "path" | "file" => {
                    spec.src = value.to_string();
                    true
                }
                "w" | "width" => set(&mut spec.width, dimension(value)),
                "h" | "height" => set(&mut spec.height, dimension(value)),
                "poshref" | "hrel" => set(&mut spec.pos_href, RefArea::parse(value)),
                "posvref" | "vrel" => set(&mut spec.pos_vref, RefArea::parse(value)),
                "posh" => set(&mut spec.pos_h, HorizontalAlign::parse(value)),
                "posv" => set(&mut spec.pos_v, value.parse::<VerticalAlign>().ok()),
                "align" => set(&mut spec.align, HorizontalAlign::parse(value)),
                "offx" => set_len(&mut spec.off_x, value),
                "offy" => set_len(&mut spec.off_y, value),
                "wrap" => match parse_wrap(value) {
                    Some(mode) => {
                        spec.wrap = mode;
                        true
                    }
                    None => false,
                },
                "distt" => set_len(&mut spec.dist.top, value),
                "distb" => set_len(&mut spec.dist.bottom, value),
                "distl" => set_len(&mut spec.dist.left, value),
                "distr" => set_len(&mut spec.dist.right, value),
                "wordpageseq" | "pageseq" => set(&mut spec.word_page_seq, value.parse().ok()),
                "srcpagew" => set(&mut source_w, lenient_length(value).filter(|v| *v > 0.0)),
                "srcpageh" => set(&mut source_h, lenient_length(value).filter(|v| *v > 0.0)),
                _ => {
                    log::debug!("Ignoring unknown image attribute '{}'.", key);
                    true
                }
            };
            if !parsed {
                log::warn!("Ignoring image attribute {}='{}': unparseable value.", key, value);
            }
        }

        if let (Some(w), Some(h)) = (source_w, source_h) {
            spec.source_page = Some(Size::new(w, h));
        }
        if spec.src.is_empty() {
            return Err(LayoutError::InvalidSpec("image directive without src".to_string()));
        }
        Ok(spec)
    }

    /// True when both reference areas are page-level.
    pub fn is_page_anchored(&self) -> bool {
        matches!(
            (self.pos_href, self.pos_vref),
            (Some(h), Some(v)) if h.is_page_level() && v.is_page_level()
        )
    }

    /// The same image as a plain inline object.
    pub fn as_inline(&self) -> Self {
        Self {
            pos_href: None,
            pos_vref: None,
            wrap: WrapMode::None,
            ..self.clone()
        }
    }
}

fn dimension(value: &str) -> Option<Dimension> {
    parse_dimension_str(value).ok()
}

fn set<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
    match value {
        Some(v) => {
            *slot = Some(v);
            true
        }
        None => false,
    }
}

fn set_len(slot: &mut f32, value: &str) -> bool {
    match lenient_length(value) {
        Some(v) => {
            *slot = v;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_page_anchored_attributes() {
        let spec = FloatSpec::from_attrs(
            r#"src="img/fig 1.png" w=100pt h="50pt" posHref=page posVref=Margin offX=0.5in offY=0 wrap=square distT=6 wordPageSeq=5"#,
        )
        .unwrap();
        assert_eq!(spec.src, "img/fig 1.png");
        assert_eq!(spec.width, Some(Dimension::Pt(100.0)));
        assert_eq!(spec.height, Some(Dimension::Pt(50.0)));
        assert_eq!(spec.pos_vref, Some(RefArea::Margin));
        assert_eq!(spec.off_x, 36.0);
        assert_eq!(spec.wrap, WrapMode::Square);
        assert_eq!(spec.dist.top, 6.0);
        assert_eq!(spec.word_page_seq, Some(5));
        assert!(spec.is_page_anchored());
    }

    #[test]
    fn paragraph_reference_is_classic() {
        let spec = FloatSpec::from_attrs("src=a.png posHref=page posVref=paragraph align=center").unwrap();
        assert!(!spec.is_page_anchored());
        assert_eq!(spec.align, Some(HorizontalAlign::Center));
        assert!(!FloatSpec::new("a.png").is_page_anchored());
    }

    #[test]
    fn bad_values_are_dropped_and_src_required() {
        let spec = FloatSpec::from_attrs("src=a.png w=huge offX=left").unwrap();
        assert_eq!(spec.width, None);
        assert_eq!(spec.off_x, 0.0);
        assert!(matches!(
            FloatSpec::from_attrs("w=10pt"),
            Err(LayoutError::InvalidSpec(_))
        ));
    }

    #[test]
    fn source_page_needs_both_dimensions() {
        let spec = FloatSpec::from_pairs([("src", "a.png"), ("srcPageW", "595"), ("srcPageH", "842")]).unwrap();
        assert_eq!(spec.source_page, Some(Size::new(595.0, 842.0)));
        let partial = FloatSpec::from_pairs([("src", "a.png"), ("srcPageW", "595")]).unwrap();
        assert_eq!(partial.source_page, None);
    }
}
