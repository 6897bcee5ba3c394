use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for the composition engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    /// Consecutive allocations that may leave the story tail in the same
    /// container before overflow resolution gives up.
    ///
    /// Defaults to `3`.
    pub stall_limit: usize,

    /// Upper bound on containers allocated by a single overflow flush.
    ///
    /// Defaults to `20`.
    pub max_pages_per_flush: usize,

    /// Document-wide page cap across every flow operation.
    ///
    /// Defaults to `2000`.
    pub safe_page_limit: usize,

    /// Row spans taller than this are flattened into one cell per row.
    ///
    /// Defaults to `25`.
    pub max_rowspan_inline: usize,

    /// Paragraph count between periodic overflow flushes.
    ///
    /// Defaults to `50`.
    pub flush_every_paragraphs: usize,

    /// Busy-wait after allocating a container so host composition can settle.
    ///
    /// Defaults to `1` ms.
    pub settle_wait_ms: u64,

    /// Line height used when estimating whether a table fits.
    pub approx_line_height: f32,

    /// Extra height added to the estimate for header rows.
    pub header_padding: f32,

    /// Absolute floor for a column width, in points.
    pub min_column_width: f32,

    /// Floor for a column width as a fraction of the average width.
    pub min_column_fraction: f32,

    /// Remove empty trailing containers and pages at the end of a run.
    pub trim_trailing_empty: bool,

    /// Try sibling image extensions when an asset is missing.
    pub extension_fallback: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            stall_limit: 3,
            max_pages_per_flush: 20,
            safe_page_limit: 2000,
            max_rowspan_inline: 25,
            flush_every_paragraphs: 50,
            settle_wait_ms: 1,
            approx_line_height: 14.4,
            header_padding: 6.0,
            min_column_width: 6.0,
            min_column_fraction: 0.08,
            trim_trailing_empty: false,
            extension_fallback: true,
        }
    }
}

impl LayoutConfig {
    pub fn settle_wait(&self) -> Duration {
        Duration::from_millis(self.settle_wait_ms)
    }

    /// A configuration without settle waits, for tests and benchmarks.
    pub fn without_settle_wait(mut self) -> Self {
        self.settle_wait_ms = 0;
        self
    }
}
