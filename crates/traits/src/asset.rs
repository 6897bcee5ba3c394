//! AssetResolver trait for turning image references into placeable files.
//!
//! Content directives reference images loosely (`figure3.jpg`, `logo`). A
//! resolver maps such a reference to an existing asset, optionally trying
//! sibling extensions when the exact name is missing.

use galley_types::Size;
use std::collections::HashMap;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Asset store unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AssetError {
    fn from(err: std::io::Error) -> Self {
        AssetError::Io(err.to_string())
    }
}

/// An asset the host can place.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAsset {
    pub path: PathBuf,
    /// Pixel/point size of the image when the resolver could determine it.
    pub natural_size: Option<Size>,
}

pub trait AssetResolver: Send + Sync + Debug {
    /// Resolves a reference to an existing asset, or `None`.
    fn resolve(&self, reference: &str) -> Option<ResolvedAsset>;

    /// Returns a human-readable name for this resolver (for logging).
    fn name(&self) -> &'static str;
}

const EXTENSION_CYCLE: [&str; 3] = ["jpg", "jpeg", "png"];

/// Lists the names to try for `reference`, in order.
///
/// The reference itself always comes first. With `fallback` enabled, a
/// `jpg`/`jpeg`/`png` reference continues through the cycle jpg → jpeg → png
/// starting after its own extension; a reference without an extension tries
/// all three.
pub fn extension_candidates(reference: &str, fallback: bool) -> Vec<String> {
    let mut out = vec![reference.to_string()];
    if !fallback {
        return out;
    }

    let file_start = reference.rfind(['/', '\\']).map(|i| i + 1).unwrap_or(0);
    let dot = reference[file_start..].rfind('.').map(|i| i + file_start);

    match dot {
        Some(dot) => {
            let stem = &reference[..dot];
            let ext = reference[dot + 1..].to_ascii_lowercase();
            if let Some(pos) = EXTENSION_CYCLE.iter().position(|e| *e == ext) {
                for step in 1..EXTENSION_CYCLE.len() {
                    let next = EXTENSION_CYCLE[(pos + step) % EXTENSION_CYCLE.len()];
                    out.push(format!("{}.{}", stem, next));
                }
            }
        }
        None => {
            for ext in EXTENSION_CYCLE {
                out.push(format!("{}.{}", reference, ext));
            }
        }
    }
    out
}

/// An in-memory resolver for tests and embedded callers.
#[derive(Debug)]
pub struct InMemoryAssetResolver {
    assets: RwLock<HashMap<String, Size>>,
    extension_fallback: bool,
}

impl Default for InMemoryAssetResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAssetResolver {
    pub fn new() -> Self {
        Self {
            assets: RwLock::new(HashMap::new()),
            extension_fallback: true,
        }
    }

    pub fn with_extension_fallback(mut self, enabled: bool) -> Self {
        self.extension_fallback = enabled;
        self
    }

    /// Registers an asset with its natural size.
    pub fn add(&self, path: impl Into<String>, natural_size: Size) -> Result<(), AssetError> {
        let mut assets = self
            .assets
            .write()
            .map_err(|_| AssetError::Unavailable("asset lock poisoned".to_string()))?;
        assets.insert(path.into(), natural_size);
        Ok(())
    }
}

impl AssetResolver for InMemoryAssetResolver {
    fn resolve(&self, reference: &str) -> Option<ResolvedAsset> {
        let assets = self.assets.read().ok()?;
        extension_candidates(reference, self.extension_fallback)
            .into_iter()
            .find_map(|candidate| {
                assets.get(&candidate).map(|size| ResolvedAsset {
                    path: PathBuf::from(&candidate),
                    natural_size: Some(*size),
                })
            })
    }

    fn name(&self) -> &'static str {
        "InMemoryAssetResolver"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_cycle_from_own_extension() {
        assert_eq!(
            extension_candidates("img/a.jpg", true),
            vec!["img/a.jpg", "img/a.jpeg", "img/a.png"]
        );
        assert_eq!(
            extension_candidates("a.PNG", true),
            vec!["a.PNG", "a.jpg", "a.jpeg"]
        );
        assert_eq!(
            extension_candidates("dir.v2/logo", true),
            vec!["dir.v2/logo", "dir.v2/logo.jpg", "dir.v2/logo.jpeg", "dir.v2/logo.png"]
        );
    }

    #[test]
    fn candidates_respect_toggle_and_foreign_extensions() {
        assert_eq!(extension_candidates("a.jpg", false), vec!["a.jpg"]);
        assert_eq!(extension_candidates("a.tif", true), vec!["a.tif"]);
    }

    #[test]
    fn in_memory_resolver_uses_fallback() {
        let resolver = InMemoryAssetResolver::new();
        resolver.add("photo.png", Size::new(300.0, 200.0)).unwrap();

        let found = resolver.resolve("photo.jpg").unwrap();
        assert_eq!(found.path, PathBuf::from("photo.png"));
        assert_eq!(found.natural_size, Some(Size::new(300.0, 200.0)));

        let strict = InMemoryAssetResolver::new().with_extension_fallback(false);
        strict.add("photo.png", Size::new(1.0, 1.0)).unwrap();
        assert!(strict.resolve("photo.jpg").is_none());
    }
}
