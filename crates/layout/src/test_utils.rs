use crate::{Composer, LayoutConfig, LayoutState};
use galley_host::{HostOptions, MemoryDocument};
use galley_style::StyleCatalog;
use galley_types::Margins;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An empty in-memory document with default host options.
pub fn memory_host() -> MemoryDocument {
    MemoryDocument::with_options(HostOptions::default())
}

pub fn test_config() -> LayoutConfig {
    LayoutConfig::default().without_settle_wait()
}

/// A composer on a fresh Letter portrait document with one-inch margins.
pub fn composer() -> Composer<MemoryDocument> {
    composer_with(memory_host(), LayoutState::default())
}

pub fn composer_with(host: MemoryDocument, layout: LayoutState) -> Composer<MemoryDocument> {
    init_logger();
    Composer::new(host, test_config(), StyleCatalog::new(), layout).unwrap()
}

pub fn composer_with_config(config: LayoutConfig) -> Composer<MemoryDocument> {
    init_logger();
    Composer::new(memory_host(), config, StyleCatalog::new(), LayoutState::default()).unwrap()
}

/// A page-sized layout with no margins, as used by float geometry tests.
pub fn borderless(width: f32, height: f32) -> LayoutState {
    LayoutState {
        orientation: if width > height {
            crate::Orientation::Landscape
        } else {
            crate::Orientation::Portrait
        },
        width,
        height,
        margins: Margins::zero(),
    }
}
