use crate::LayoutError;
use crate::config::LayoutConfig;
use crate::cursor::FlowCursor;
use crate::floating::WordPageSequenceMap;
use crate::state::LayoutState;
use galley_style::StyleCatalog;
use galley_traits::{AssetResolver, DocumentHost};
use std::sync::Arc;

/// Drives a [`DocumentHost`] through a composition run.
///
/// The composer owns the host for the duration of the run; take it back with
/// [`Composer::into_host`].
pub struct Composer<H: DocumentHost> {
    pub(crate) host: H,
    pub(crate) config: LayoutConfig,
    pub(crate) catalog: StyleCatalog,
    pub(crate) default_layout: LayoutState,
    pub(crate) cursor: FlowCursor,
    pub(crate) sequences: WordPageSequenceMap,
    pub(crate) assets: Option<Arc<dyn AssetResolver>>,
}

impl<H: DocumentHost> Composer<H> {
    /// Prepares the first page and the first writable container.
    ///
    /// An existing first page is reused. Geometry failures are tolerated; not
    /// getting a container at all is fatal.
    pub fn new(
        mut host: H,
        config: LayoutConfig,
        catalog: StyleCatalog,
        default_layout: LayoutState,
    ) -> Result<Self, LayoutError> {
        let default_layout = default_layout.normalized();
        let page = match host.page_at(0) {
            Some(page) => page,
            None => host
                .add_page(None, true)
                .map_err(|e| LayoutError::NoWritableContainer(e.to_string()))?,
        };

        if let Err(e) = host.resize_page(page, default_layout.page_size()) {
            log::warn!("Could not apply default page size to {}: {}", page, e);
        }
        if let Err(e) = host.set_page_margins(page, default_layout.margins) {
            log::warn!("Could not apply default margins to {}: {}", page, e);
        }

        let bounds = host.page_bounds(page)?;
        let margins = host.page_margins(page)?;
        let container = host
            .create_text_container(page, bounds.inset(&margins))
            .map_err(|e| LayoutError::NoWritableContainer(e.to_string()))?;
        let story = host.container_story(container).map_err(|_| LayoutError::NoStory)?;
        log::info!(
            "Composition started on {} ({}x{}pt, {}).",
            page,
            default_layout.width,
            default_layout.height,
            default_layout.orientation
        );

        Ok(Self {
            host,
            config,
            catalog,
            default_layout,
            cursor: FlowCursor::new(page, container, story, default_layout),
            sequences: WordPageSequenceMap::default(),
            assets: None,
        })
    }

    /// Resolves float sources through `resolver` instead of using them as paths.
    pub fn with_assets(mut self, resolver: Arc<dyn AssetResolver>) -> Self {
        self.assets = Some(resolver);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn cursor(&self) -> &FlowCursor {
        &self.cursor
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn default_layout(&self) -> &LayoutState {
        &self.default_layout
    }

    pub fn sequences(&self) -> &WordPageSequenceMap {
        &self.sequences
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use galley_traits::DocumentHost;

    #[test]
    fn bootstrap_creates_first_container_in_margin_box() {
        let composer = composer();
        let host = composer.host();
        assert_eq!(host.page_count(), 1);
        let bounds = host.container_bounds(composer.cursor().container).unwrap();
        assert_eq!(bounds.x, 72.0);
        assert_eq!(bounds.width, 468.0);
        assert_eq!(bounds.height, 648.0);
        assert!(composer.cursor().at_paragraph_start);
    }

    #[test]
    fn bootstrap_reuses_existing_page_and_survives_locked_geometry() {
        let mut host = memory_host();
        host.options_mut().reject_resize = true;
        host.options_mut().reject_margins = true;
        let first = host.add_page(None, true).unwrap();
        let composer = composer_with(host, Default::default());
        assert_eq!(composer.cursor().page, first);
        assert_eq!(composer.host().page_count(), 1);
        // Host defaults stayed in place: 612x792 with 36pt margins.
        let bounds = composer.host().container_bounds(composer.cursor().container).unwrap();
        assert_eq!(bounds.x, 36.0);
    }
}
