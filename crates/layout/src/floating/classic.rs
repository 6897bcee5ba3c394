//! Images anchored in the text flow.

use super::page_anchor::requested_size;
use super::spec::FloatSpec;
use super::{FloatPlacement, PlacementMode};
use crate::LayoutError;
use crate::composer::Composer;
use crate::strategy::{attempt, describe_failures, try_in_order};
use galley_traits::{BreakKind, DocumentHost, PlacedItem, TextWrap, WrapMode};
use galley_types::{Rect, Size};
use std::path::Path;

/// Target size of an inline image: explicit size completed by aspect ratio,
/// then shrunk (aspect preserved) to fit `max`.
pub(crate) fn inline_size(spec: &FloatSpec, natural: Option<Size>, max: Size) -> Option<Size> {
    requested_size(spec, natural, max).map(|size| size.fit_within(max))
}

impl<H: DocumentHost> Composer<H> {
    /// Places the image inline in its own paragraph of the active story, sizes
    /// it to the active container and resolves any overflow it caused.
    ///
    /// Geometry is applied through bounds, then anchored size, then uniform
    /// scaling; when all three are refused the image keeps its natural size.
    /// `natural` overrides the size the host reports for the asset. With
    /// `fallback` set the spec's wrap is ignored.
    pub(crate) fn place_classic(
        &mut self,
        spec: &FloatSpec,
        asset: &Path,
        natural: Option<Size>,
        fallback: bool,
    ) -> Result<FloatPlacement, LayoutError> {
        let story = self.cursor.story;
        if !self.cursor.at_paragraph_start {
            self.host.insert_break(story, BreakKind::Paragraph)?;
            self.cursor.at_paragraph_start = true;
        }

        let placed = self.host.place_inline(story, asset)?;
        if let PlacedItem::Group { depth, .. } = placed {
            log::debug!("'{}' was placed inside a group {} levels deep.", spec.src, depth);
        }
        let graphic = placed.frame();

        let container = self.cursor.container;
        let inner = self
            .host
            .container_bounds(container)?
            .inset(&self.host.container_inset(container)?);
        let page = self.host.container_page(container)?;
        let printable = self
            .host
            .page_bounds(page)?
            .inset(&self.host.page_margins(page)?)
            .height;
        let max = Size::new(inner.width, inner.height.min(printable));
        let natural = natural.or_else(|| self.host.graphic_natural_size(graphic).ok());

        match inline_size(spec, natural, max) {
            Some(size) => {
                let current = self.host.graphic_bounds(graphic)?;
                let align = spec.align.or(spec.pos_h).unwrap_or_default();
                let target = Rect::new(
                    inner.left() + align.offset(inner.width, size.width),
                    current.y,
                    size.width,
                    size.height,
                );
                let factor = if current.width > 0.0 {
                    size.width / current.width
                } else {
                    1.0
                };
                let applied = try_in_order(
                    &mut self.host,
                    "inline image geometry",
                    vec![
                        attempt("bounds", move |h: &mut H| h.set_graphic_bounds(graphic, target)),
                        attempt("anchored size", move |h: &mut H| h.set_anchored_size(graphic, size)),
                        attempt("scale", move |h: &mut H| h.scale_graphic(graphic, factor)),
                    ],
                );
                if let Err(failures) = applied {
                    log::warn!(
                        "Could not size '{}', keeping its natural size: {}",
                        spec.src,
                        describe_failures(&failures)
                    );
                }
            }
            None => log::warn!("No usable size for '{}'; keeping its natural size.", spec.src),
        }

        if !fallback && spec.wrap != WrapMode::None {
            let wrap = TextWrap {
                mode: spec.wrap,
                offsets: spec.dist,
            };
            if let Err(e) = self.host.set_text_wrap(graphic, &wrap) {
                log::warn!("Could not apply wrap to '{}': {}", spec.src, e);
            }
        }

        self.close_anchor_paragraph()?;
        self.flush_overflow()?;

        let page = self.host.graphic_page(graphic)?;
        if let (Some(seq), Some(page)) = (spec.word_page_seq, page) {
            self.sequences.record(seq, page);
        }
        Ok(FloatPlacement {
            graphic,
            page,
            bounds: self.host.graphic_bounds(graphic)?,
            mode: if fallback {
                PlacementMode::InlineFallback
            } else {
                PlacementMode::Inline
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galley_style::Dimension;

    #[test]
    fn inline_size_caps_width_and_keeps_aspect() {
        let spec = FloatSpec {
            width: Some(Dimension::Pt(1000.0)),
            ..FloatSpec::new("a.png")
        };
        let size = inline_size(&spec, Some(Size::new(400.0, 200.0)), Size::new(468.0, 648.0)).unwrap();
        assert!((size.width - 468.0).abs() < 0.01);
        assert!((size.height - 234.0).abs() < 0.01);
    }

    #[test]
    fn inline_size_respects_height_cap() {
        let spec = FloatSpec {
            height: Some(Dimension::Percent(200.0)),
            ..FloatSpec::new("a.png")
        };
        let size = inline_size(&spec, Some(Size::new(100.0, 100.0)), Size::new(468.0, 300.0)).unwrap();
        assert!((size.height - 300.0).abs() < 0.01);
        assert!((size.width - 300.0).abs() < 0.01);
    }
}
