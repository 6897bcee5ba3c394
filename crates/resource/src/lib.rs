//! Asset resolvers for the galley composition engine.
//!
//! This crate provides the filesystem implementation of the `AssetResolver`
//! trait from galley-traits.
//!
//! ## Available Resolvers
//!
//! - [`FilesystemAssetResolver`]: Resolves image references under a base directory
//!
//! ## Re-exports
//!
//! For convenience, we also re-export the in-memory resolver from galley-traits:
//! - [`InMemoryAssetResolver`]: Pre-populated in-memory registry

mod filesystem;

pub use filesystem::FilesystemAssetResolver;

// Re-export the in-memory resolver from galley-traits for convenience
pub use galley_traits::InMemoryAssetResolver;
