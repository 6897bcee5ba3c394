//! The galley composition engine.
//!
//! A [`Composer`] drives a [`galley_traits::DocumentHost`] through an explicit
//! [`FlowCursor`]: it keeps page geometry consistent with the requested
//! layout, resolves story overflow by allocating linked containers, positions
//! floating graphics, builds tables from span-described cell matrices and
//! applies inline formatting to text runs.

use galley_traits::HostError;
use galley_types::ContainerId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Host operation failed: {0}")]
    Host(#[from] HostError),

    #[error("Flow stalled: tail stayed in {container} for {repeats} consecutive allocations")]
    Stalled { container: ContainerId, repeats: usize },

    #[error("No writable container could be obtained: {0}")]
    NoWritableContainer(String),

    #[error("No active story to write into")]
    NoStory,

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Invalid specification: {0}")]
    InvalidSpec(String),

    #[error("Geometry could not be applied: {0}")]
    Geometry(String),

    #[error("Document reached the page limit of {0}")]
    PageLimit(usize),
}

pub mod config;
pub mod floating;
pub mod flow;
pub mod inline;
pub mod state;
pub mod table;

mod composer;
mod cursor;
mod manager;
mod strategy;

pub use composer::Composer;
pub use config::LayoutConfig;
pub use cursor::FlowCursor;
pub use floating::{FloatPlacement, FloatSpec, HorizontalAlign, PlacementMode, RefArea, WordPageSequenceMap};
pub use flow::{FlowReport, FlowStatus};
pub use inline::{InlineStyle, NoteMarker, RunFormat};
pub use manager::FrameOptions;
pub use state::{LayoutState, Orientation, PartialLayout, states_equal};
pub use table::{BorderSpec, CellSpec, TableOutcome, TableSpec, WidthPolicy};

#[cfg(test)]
mod test_utils;
