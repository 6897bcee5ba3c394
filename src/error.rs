use galley_layout::LayoutError;
use galley_traits::HostError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end or reject a document build.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Host document failed: {0}")]
    Host(#[from] HostError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Template file '{0}' does not exist")]
    TemplateMissing(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// True for errors after which no further content can be composed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::TemplateMissing(_)
                | PipelineError::Config(_)
                | PipelineError::Layout(LayoutError::NoWritableContainer(_))
                | PipelineError::Layout(LayoutError::NoStory)
        )
    }
}
