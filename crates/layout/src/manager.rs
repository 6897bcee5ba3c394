//! Layout State Manager: keeps page geometry in step with layout requests.

use crate::LayoutError;
use crate::composer::Composer;
use crate::state::{LayoutState, PartialLayout, states_equal};
use galley_traits::{BreakKind, DocumentHost};
use galley_types::{ContainerId, PageId};

/// Where and how [`Composer::create_layout_frame`] adds its page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameOptions {
    /// Page to insert after; `None` appends at the end of the document.
    pub after: Option<PageId>,
    pub force_new_spread: bool,
}

impl FrameOptions {
    pub fn after(page: PageId) -> Self {
        Self {
            after: Some(page),
            force_new_spread: false,
        }
    }

    pub fn new_spread(mut self, force: bool) -> Self {
        self.force_new_spread = force;
        self
    }
}

impl<H: DocumentHost> Composer<H> {
    pub fn current_layout(&self) -> &LayoutState {
        &self.cursor.layout
    }

    /// Switches the flow to a page laid out as `target`.
    ///
    /// Missing fields come from the default layout. When the result matches
    /// the current layout nothing happens and `false` is returned; otherwise a
    /// new page (on a new spread when the orientation changes) and container
    /// are created, linked after the active container and made active.
    /// Callers wanting the switch to start on the new page insert a page
    /// break first.
    pub fn ensure_layout(&mut self, target: &PartialLayout) -> Result<bool, LayoutError> {
        let resolved = target.resolve(&self.default_layout);
        if states_equal(&self.cursor.layout, &resolved) {
            log::debug!("Layout already {} {}x{}; no switch.", resolved.orientation, resolved.width, resolved.height);
            return Ok(false);
        }

        let force_new_spread = resolved.orientation != self.cursor.layout.orientation;
        let options = FrameOptions::after(self.cursor.page).new_spread(force_new_spread);
        let (page, container) = self.create_layout_frame(&resolved, Some(self.cursor.container), options)?;
        self.cursor.advance_to(page, container);

        // A refused resize or margin change leaves the page as it was; the
        // cursor keeps what the page really shows so a later request re-applies.
        let actual = LayoutState::from_page(self.host.page_bounds(page)?, self.host.page_margins(page)?);
        if !states_equal(&actual, &resolved) {
            log::warn!(
                "{} kept {}x{}pt instead of the requested {}x{}pt.",
                page,
                actual.width,
                actual.height,
                resolved.width,
                resolved.height
            );
            self.cursor.layout = actual;
            return Ok(true);
        }
        self.cursor.layout = resolved;
        log::info!(
            "Switched layout to {} {}x{}pt on {}.",
            resolved.orientation,
            resolved.width,
            resolved.height,
            page
        );
        Ok(true)
    }

    /// Explicit layout change: the flow continues on a new page laid out as
    /// `target`. Pending overflow is resolved in the old layout first.
    pub fn switch_layout(&mut self, target: &PartialLayout) -> Result<bool, LayoutError> {
        let resolved = target.resolve(&self.default_layout);
        if states_equal(&self.cursor.layout, &resolved) {
            return Ok(false);
        }
        self.flush_overflow()?;
        self.host.insert_break(self.cursor.story, BreakKind::Page)?;
        self.cursor.at_paragraph_start = true;
        self.cursor.pending_restore = None;
        self.ensure_layout(target)
    }

    /// Adds a page shaped like `target` and a writable container covering its
    /// margin box, linked after `link_from` when given.
    ///
    /// Resize and margin failures only leave the page with its inherited
    /// geometry. If the host cannot insert after the base page, the page is
    /// appended at the end of the document instead.
    pub fn create_layout_frame(
        &mut self,
        target: &LayoutState,
        link_from: Option<ContainerId>,
        options: FrameOptions,
    ) -> Result<(PageId, ContainerId), LayoutError> {
        let limit = self.config.safe_page_limit;
        if self.host.page_count() >= limit {
            return Err(LayoutError::PageLimit(limit));
        }

        let page = match self.host.add_page(options.after, options.force_new_spread) {
            Ok(page) => page,
            Err(e) if options.after.is_some() => {
                log::warn!("Could not insert page after {:?} ({}); appending instead.", options.after, e);
                self.host.add_page(None, options.force_new_spread)?
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(e) = self.host.resize_page(page, target.page_size()) {
            log::warn!("Could not resize {} to {}x{}: {}", page, target.width, target.height, e);
        }
        if let Err(e) = self.host.set_page_margins(page, target.margins) {
            log::warn!("Could not set margins on {}: {}", page, e);
        }

        let bounds = self.host.page_bounds(page)?;
        let margins = self.host.page_margins(page)?;
        let container = self.host.create_text_container(page, bounds.inset(&margins))?;
        if let Some(from) = link_from {
            self.host.link_containers(from, container)?;
        }
        log::debug!("Created {} on {} linked from {:?}.", container, page, link_from);
        Ok((page, container))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Orientation;
    use crate::test_utils::*;

    fn landscape() -> PartialLayout {
        PartialLayout {
            orientation: Some(Orientation::Landscape),
            ..Default::default()
        }
    }

    #[test]
    fn ensure_layout_is_idempotent() {
        let mut composer = composer();
        let first_container = composer.cursor().container;
        assert!(composer.ensure_layout(&landscape()).unwrap());
        let switched = composer.cursor().container;
        assert!(!composer.ensure_layout(&landscape()).unwrap());

        assert_ne!(first_container, switched);
        assert_eq!(composer.cursor().container, switched);
        assert_eq!(composer.host().page_count(), 2);
        assert_eq!(composer.host().next_container(first_container).unwrap(), Some(switched));
    }

    #[test]
    fn orientation_change_starts_new_spread() {
        let mut composer = composer();
        let first_page = composer.cursor().page;
        composer.ensure_layout(&landscape()).unwrap();
        let page = composer.cursor().page;
        let host = composer.host();
        assert_ne!(host.page_spread(first_page).unwrap(), host.page_spread(page).unwrap());
        let bounds = host.page_bounds(page).unwrap();
        assert_eq!((bounds.width, bounds.height), (792.0, 612.0));
    }

    #[test]
    fn same_orientation_switch_shares_spread() {
        let mut composer = composer();
        let first_page = composer.cursor().page;
        let narrow = PartialLayout {
            margin_left: Some(144.0),
            ..Default::default()
        };
        composer.ensure_layout(&narrow).unwrap();
        let host = composer.host();
        let page = composer.cursor().page;
        assert_eq!(host.page_spread(first_page).unwrap(), host.page_spread(page).unwrap());
        assert_eq!(host.container_bounds(composer.cursor().container).unwrap().x, 144.0);
    }

    #[test]
    fn frame_falls_back_to_append_and_tolerates_locked_geometry() {
        let mut host = memory_host();
        host.options_mut().reject_add_page_after = true;
        let mut composer = composer_with(host, LayoutState::default());
        composer.host_mut().options_mut().reject_resize = true;
        let first = composer.cursor().page;

        let target = landscape().resolve(&LayoutState::default());
        let (page, _) = composer
            .create_layout_frame(&target, None, FrameOptions::after(first))
            .unwrap();
        let host = composer.host();
        assert_eq!(host.page_index(page).unwrap(), 1);
        // Resize was refused, so the page keeps portrait geometry.
        assert_eq!(host.page_bounds(page).unwrap().width, 612.0);
    }

    #[test]
    fn refused_resize_is_not_recorded_as_applied() {
        let mut composer = composer();
        composer.host_mut().options_mut().reject_resize = true;
        assert!(composer.ensure_layout(&landscape()).unwrap());
        assert_eq!(composer.current_layout().orientation, Orientation::Portrait);
        let pages = composer.host().page_count();

        composer.host_mut().options_mut().reject_resize = false;
        assert!(composer.ensure_layout(&landscape()).unwrap());
        assert_eq!(composer.host().page_count(), pages + 1);
        assert_eq!(composer.current_layout().orientation, Orientation::Landscape);
        let bounds = composer.host().page_bounds(composer.cursor().page).unwrap();
        assert_eq!((bounds.width, bounds.height), (792.0, 612.0));
    }

    #[test]
    fn explicit_switch_breaks_to_new_page() {
        let mut composer = composer();
        composer.insert_run("Portrait text").unwrap();
        assert!(composer.switch_layout(&landscape()).unwrap());
        composer.insert_run("Landscape text").unwrap();
        composer.flush_overflow().unwrap();

        let container = composer.cursor().container;
        assert_eq!(composer.host().container(container).unwrap().pieces, 1);
        assert!(!composer.switch_layout(&landscape()).unwrap());
    }

    #[test]
    fn page_limit_stops_allocation() {
        let mut config = test_config();
        config.safe_page_limit = 1;
        let mut composer = composer_with_config(config);
        let err = composer.ensure_layout(&landscape()).unwrap_err();
        assert!(matches!(err, LayoutError::PageLimit(1)));
    }
}
