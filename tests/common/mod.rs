#![allow(dead_code)]

pub mod fixtures;

use galley::host::{DocumentSnapshot, MemoryDocument};
use galley::{Directive, DocumentBuilder, PipelineError, RunOutcome};
use serde_json::Value;

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Parses a JSON directive list.
pub fn directives(content: Value) -> Result<Vec<Directive>, PipelineError> {
    Ok(serde_json::from_value(content)?)
}

/// Composes `content` with the default template into a fresh document.
pub fn compose(content: Value) -> Result<RunOutcome<MemoryDocument>, PipelineError> {
    compose_with(&DocumentBuilder::new(), content)
}

pub fn compose_with(
    builder: &DocumentBuilder,
    content: Value,
) -> Result<RunOutcome<MemoryDocument>, PipelineError> {
    builder.build(&directives(content)?)
}

/// Snapshot of the composed document, for assertions.
pub fn snapshot(outcome: &RunOutcome<MemoryDocument>) -> DocumentSnapshot {
    outcome.host.snapshot()
}

/// Composed pieces in all containers of the page at `index`.
pub fn pieces_on_page(snap: &DocumentSnapshot, index: usize) -> usize {
    let page = snap.pages[index].id;
    snap.containers.iter().filter(|c| c.page == page).map(|c| c.pieces).sum()
}
