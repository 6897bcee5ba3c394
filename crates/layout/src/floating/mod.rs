//! Floating Placement Engine.
//!
//! Images are either pinned to a page (both reference areas page-level) or
//! anchored inline in the flow. When page placement fails at any step the
//! image is pushed through the inline path with wrapping disabled, so an
//! image is never lost to a geometry failure.

mod classic;
mod page_anchor;
mod sequence;
mod spec;

pub use sequence::WordPageSequenceMap;
pub use spec::{FloatSpec, HorizontalAlign, RefArea};

use crate::LayoutError;
use crate::composer::Composer;
use galley_traits::{BreakKind, CharFormat, DocumentHost};
use galley_types::{GraphicId, PageId, Rect, Size};
use std::path::PathBuf;

/// Keeps the anchor paragraph from being empty.
pub(crate) const ZERO_WIDTH_JOINER: &str = "\u{200d}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementMode {
    PageAnchored,
    Inline,
    /// Inline placement after the page-anchored path failed.
    InlineFallback,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FloatPlacement {
    pub graphic: GraphicId,
    /// Page the graphic ended up on, if composition reached it.
    pub page: Option<PageId>,
    pub bounds: Rect,
    pub mode: PlacementMode,
}

impl<H: DocumentHost> Composer<H> {
    /// Places an image described by `spec`.
    pub fn place_float(&mut self, spec: &FloatSpec) -> Result<FloatPlacement, LayoutError> {
        let (asset, natural) = self.resolve_asset(&spec.src)?;

        if !spec.is_page_anchored() {
            return self.place_classic(spec, &asset, natural, false);
        }
        match self.place_page_anchored(spec, &asset, natural) {
            Ok(placement) => Ok(placement),
            Err(e) => {
                log::warn!("Page placement of '{}' failed ({}); placing it inline.", spec.src, e);
                self.place_classic(&spec.as_inline(), &asset, natural, true)
            }
        }
    }

    fn resolve_asset(&self, src: &str) -> Result<(PathBuf, Option<Size>), LayoutError> {
        match &self.assets {
            Some(resolver) => resolver
                .resolve(src)
                .map(|found| (found.path, found.natural_size))
                .ok_or_else(|| LayoutError::AssetNotFound(src.to_string())),
            None => Ok((PathBuf::from(src), None)),
        }
    }

    /// Ends the paragraph holding an anchor so following content starts fresh.
    pub(crate) fn close_anchor_paragraph(&mut self) -> Result<(), LayoutError> {
        let story = self.cursor.story;
        self.host.insert_text(story, ZERO_WIDTH_JOINER, &CharFormat::default())?;
        self.host.insert_break(story, BreakKind::Paragraph)?;
        self.cursor.at_paragraph_start = true;
        self.cursor.last_anchor = Some(self.host.story_length(story)?);
        Ok(())
    }
}
