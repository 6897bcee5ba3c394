//! Floats positioned against the page or its margin box.

use super::spec::{FloatSpec, HorizontalAlign, RefArea};
use super::{FloatPlacement, PlacementMode};
use crate::LayoutError;
use crate::composer::Composer;
use galley_style::VerticalAlign;
use galley_traits::{DocumentHost, TextWrap, WrapMode};
use galley_types::{Margins, PageId, Rect, Size};
use std::path::Path;

fn reference_rect(area: Option<RefArea>, page: Rect, margin_box: Rect) -> Rect {
    match area {
        Some(RefArea::Margin) => margin_box,
        _ => page,
    }
}

/// Size from the spec, completing a missing dimension from the natural
/// aspect ratio (or a square when none is known).
pub(crate) fn requested_size(spec: &FloatSpec, natural: Option<Size>, reference: Size) -> Option<Size> {
    let w = spec.width.and_then(|d| d.resolve(reference.width));
    let h = spec.height.and_then(|d| d.resolve(reference.height));
    let aspect = natural.and_then(|n| n.aspect_ratio());
    let size = match (w, h) {
        (Some(w), Some(h)) => Size::new(w, h),
        (Some(w), None) => Size::new(w, aspect.map(|a| w / a).unwrap_or(w)),
        (None, Some(h)) => Size::new(aspect.map(|a| h * a).unwrap_or(h), h),
        (None, None) => natural?,
    };
    (size.width > 0.0 && size.height > 0.0).then_some(size)
}

/// Absolute bounds of a page-anchored float.
///
/// Offsets are scaled by the ratio of page sizes when the spec carries its
/// source page size. The result is kept inside the reference area minus the
/// spec's stand-off distances, shrinking it (aspect preserved) if needed.
pub(crate) fn page_anchored_rect(
    spec: &FloatSpec,
    page: Rect,
    margins: Margins,
    natural: Option<Size>,
) -> Result<Rect, LayoutError> {
    let margin_box = page.inset(&margins);
    let area_h = reference_rect(spec.pos_href, page, margin_box);
    let area_v = reference_rect(spec.pos_vref, page, margin_box);

    let mut size = requested_size(spec, natural, Size::new(area_h.width, area_v.height))
        .ok_or_else(|| LayoutError::Geometry(format!("no usable size for '{}'", spec.src)))?;

    let (mut off_x, mut off_y) = (spec.off_x, spec.off_y);
    if let Some(source) = spec.source_page {
        off_x *= page.width / source.width;
        off_y *= page.height / source.height;
    }

    let guard_left = area_h.left() + spec.dist.left;
    let guard_right = area_h.right() - spec.dist.right;
    let guard_top = area_v.top() + spec.dist.top;
    let guard_bottom = area_v.bottom() - spec.dist.bottom;
    let available = Size::new(guard_right - guard_left, guard_bottom - guard_top);
    if available.width <= 0.0 || available.height <= 0.0 {
        return Err(LayoutError::Geometry(format!(
            "stand-off distances leave no room for '{}'",
            spec.src
        )));
    }
    size = size.fit_within(available);
    // Scaling may round a fitted side a hair past the guards.
    size.width = size.width.min(available.width);
    size.height = size.height.min(available.height);

    let x = area_h.left()
        + spec
            .pos_h
            .unwrap_or_default()
            .offset(area_h.width, size.width)
        + off_x;
    let y = area_v.top()
        + match spec.pos_v.unwrap_or_default() {
            VerticalAlign::Top => 0.0,
            VerticalAlign::Center => (area_v.height - size.height) / 2.0,
            VerticalAlign::Bottom => area_v.height - size.height,
        }
        + off_y;

    let x = x.min(guard_right - size.width).max(guard_left);
    let y = y.min(guard_bottom - size.height).max(guard_top);
    Ok(Rect::new(x, y, size.width, size.height))
}

impl<H: DocumentHost> Composer<H> {
    /// The page a page-anchored float lands on: its sequence page if it has
    /// one, else the active page, else the first page.
    pub(crate) fn float_target_page(&mut self, spec: &FloatSpec) -> Result<PageId, LayoutError> {
        if let Some(seq) = spec.word_page_seq {
            return self.page_for_sequence(seq);
        }
        if self.host.page_index(self.cursor.page).is_ok() {
            return Ok(self.cursor.page);
        }
        self.host
            .page_at(0)
            .ok_or_else(|| LayoutError::Geometry("document has no pages".to_string()))
    }

    pub(crate) fn place_page_anchored(
        &mut self,
        spec: &FloatSpec,
        asset: &Path,
        natural: Option<Size>,
    ) -> Result<FloatPlacement, LayoutError> {
        let page = self.float_target_page(spec)?;
        let page_bounds = self.host.page_bounds(page)?;
        let margins = self.host.page_margins(page)?;
        let mut bounds = page_anchored_rect(spec, page_bounds, margins, natural)?;

        let graphic = self.host.create_graphic_frame(page, bounds)?;
        let actual = match self.host.place_asset(graphic, asset) {
            Ok(size) => size,
            Err(e) => {
                if let Err(cleanup) = self.host.remove_graphic(graphic) {
                    log::warn!("Could not remove empty frame {}: {}", graphic, cleanup);
                }
                return Err(e.into());
            }
        };

        // The size may have depended on an aspect ratio only known now.
        if natural.is_none() && (spec.width.is_none() || spec.height.is_none()) {
            let corrected = page_anchored_rect(spec, page_bounds, margins, Some(actual))?;
            if !corrected.approx_eq(&bounds) {
                match self.host.set_graphic_bounds(graphic, corrected) {
                    Ok(()) => bounds = corrected,
                    Err(e) => log::warn!("Could not correct bounds of {}: {}", graphic, e),
                }
            }
        }

        if let Err(e) = self.host.fit_content_proportionally(graphic) {
            log::warn!("Could not fit content of {}: {}", graphic, e);
        }
        if spec.wrap != WrapMode::None {
            let wrap = TextWrap {
                mode: spec.wrap,
                offsets: spec.dist,
            };
            if let Err(e) = self.host.set_text_wrap(graphic, &wrap) {
                log::warn!("Could not apply wrap to {}: {}", graphic, e);
            }
        }

        self.close_anchor_paragraph()?;
        log::debug!("Placed '{}' on {} at {:?}.", spec.src, page, bounds.to_bounds());
        Ok(FloatPlacement {
            graphic,
            page: Some(page),
            bounds,
            mode: PlacementMode::PageAnchored,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galley_style::Dimension;

    fn spec(w: f32, h: f32) -> FloatSpec {
        FloatSpec {
            width: Some(Dimension::Pt(w)),
            height: Some(Dimension::Pt(h)),
            pos_href: Some(RefArea::Page),
            pos_vref: Some(RefArea::Page),
            ..FloatSpec::new("a.png")
        }
    }

    #[test]
    fn top_left_of_borderless_page() {
        let page = Rect::from_bounds(0.0, 0.0, 792.0, 612.0);
        let rect = page_anchored_rect(&spec(100.0, 50.0), page, Margins::zero(), None).unwrap();
        assert!(rect.approx_eq(&Rect::new(0.0, 0.0, 100.0, 50.0)));
    }

    #[test]
    fn margin_reference_and_alignment() {
        let page = Rect::new(0.0, 0.0, 612.0, 792.0);
        let mut s = spec(100.0, 50.0);
        s.pos_href = Some(RefArea::Margin);
        s.pos_h = Some(HorizontalAlign::Right);
        s.pos_v = Some(VerticalAlign::Bottom);
        let rect = page_anchored_rect(&s, page, Margins::all(72.0), None).unwrap();
        // Right edge of the margin box, bottom edge of the page.
        assert!(rect.approx_eq(&Rect::new(440.0, 742.0, 100.0, 50.0)));
    }

    #[test]
    fn offsets_scale_with_source_page() {
        let page = Rect::new(0.0, 0.0, 612.0, 792.0);
        let mut s = spec(50.0, 50.0);
        s.off_x = 100.0;
        s.off_y = 100.0;
        s.source_page = Some(Size::new(306.0, 396.0));
        let rect = page_anchored_rect(&s, page, Margins::zero(), None).unwrap();
        assert!(rect.approx_eq(&Rect::new(200.0, 200.0, 50.0, 50.0)));
    }

    #[test]
    fn clamps_inside_guards_and_shrinks() {
        let page = Rect::new(0.0, 0.0, 612.0, 792.0);
        let mut s = spec(100.0, 50.0);
        s.off_x = 600.0;
        s.dist = Margins::all(10.0);
        let rect = page_anchored_rect(&s, page, Margins::zero(), None).unwrap();
        assert!(rect.approx_eq(&Rect::new(502.0, 10.0, 100.0, 50.0)));

        let huge = page_anchored_rect(&spec(1224.0, 396.0), page, Margins::zero(), None).unwrap();
        assert!((huge.width - 612.0).abs() < 0.01);
        assert!((huge.height - 198.0).abs() < 0.01);
    }

    #[test]
    fn oversized_float_with_fractional_guards_stays_inside() {
        let page = Rect::new(0.0, 0.0, 612.0, 792.0);
        for i in 0..40 {
            let mut s = spec(613.0 + i as f32 * 0.37, 10.0);
            s.dist.left = 7.3;
            s.dist.right = 11.1;
            let rect = page_anchored_rect(&s, page, Margins::zero(), None).unwrap();
            assert!(rect.left() >= 7.3 - 0.001, "left {} for step {}", rect.left(), i);
            assert!(rect.right() <= 612.0 - 11.1 + 0.001, "right {} for step {}", rect.right(), i);
        }
    }

    #[test]
    fn missing_dimension_uses_natural_aspect() {
        let page = Rect::new(0.0, 0.0, 612.0, 792.0);
        let mut s = spec(200.0, 0.0);
        s.height = None;
        let rect = page_anchored_rect(&s, page, Margins::zero(), Some(Size::new(400.0, 100.0))).unwrap();
        assert!((rect.height - 50.0).abs() < 0.01);

        s.width = None;
        assert!(page_anchored_rect(&s, page, Margins::zero(), None).is_err());
    }
}
