//! An in-memory paginated document.
//!
//! `MemoryDocument` implements [`galley_traits::DocumentHost`] with a small,
//! deterministic composition model: paragraph text is measured with a fixed
//! average glyph width, inline graphics and table rows are placed as blocks,
//! and content that does not fit the container chain is overset. It backs the
//! CLI and every engine test.

mod compose;
mod document;
pub mod model;
mod snapshot;

pub use document::{HostOptions, MemoryDocument, TextMetrics, WidthAcceptance};
pub use model::{
    Cell, Container, Graphic, GraphicPlacement, Merge, Note, Page, Spread, Story, StoryItem, Table,
};
pub use snapshot::{DocumentSnapshot, StorySummary};
