//! Galley composes content streams into paginated documents.
//!
//! A run reads a [`Template`] (page geometry and styles), a [`RunConfig`] and
//! a stream of [`Directive`]s, and drives a [`galley_layout::Composer`] over
//! a [`galley_traits::DocumentHost`]. Failures of single content units are
//! logged and skipped; the run only stops when nothing can be written.

pub mod builder;
pub mod config;
pub mod directive;
pub mod error;
pub mod logging;
pub mod progress;
pub mod template;

pub use builder::{DocumentBuilder, RunOutcome, RunReport};
pub use config::RunConfig;
pub use directive::{Directive, ImageAttrs, load_directives, parse_directives};
pub use error::PipelineError;
pub use progress::ProgressReporter;
pub use template::Template;

pub use galley_host as host;
pub use galley_layout as layout;
