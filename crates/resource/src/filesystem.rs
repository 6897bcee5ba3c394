//! Filesystem-based asset resolver for native platforms.
//!
//! References are resolved relative to a base directory, trying sibling
//! extensions (jpg → jpeg → png) when enabled.
//!
//! # Security
//!
//! The resolver validates that all resolved paths remain within the base path
//! to prevent directory traversal (e.g., `../../../etc/passwd`).

use galley_traits::{AssetResolver, ResolvedAsset, extension_candidates};
use galley_types::Size;
use std::path::{Component, Path, PathBuf};

#[derive(Debug)]
pub struct FilesystemAssetResolver {
    base_path: PathBuf,
    /// Canonicalized base path for security checks
    canonical_base: Option<PathBuf>,
    extension_fallback: bool,
}

impl FilesystemAssetResolver {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        let base = base_path.as_ref().to_path_buf();
        let canonical = base.canonicalize().ok();
        Self {
            base_path: base,
            canonical_base: canonical,
            extension_fallback: true,
        }
    }

    pub fn with_extension_fallback(mut self, enabled: bool) -> Self {
        self.extension_fallback = enabled;
        self
    }

    pub fn base(&self) -> &Path {
        &self.base_path
    }

    /// Returns the existing file for `candidate`, or `None` if it is missing or
    /// would escape the base directory.
    fn existing_file(&self, candidate: &str) -> Option<PathBuf> {
        let candidate_path = Path::new(candidate);
        if candidate_path.is_absolute() {
            return None;
        }
        if candidate_path
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return None;
        }

        let full_path = self.base_path.join(candidate_path);
        let canonical = full_path.canonicalize().ok()?;
        if let Some(base) = &self.canonical_base {
            if !canonical.starts_with(base) {
                return None;
            }
        }
        canonical.is_file().then_some(canonical)
    }
}

/// Reads image dimensions from the file header, treating one pixel as one point.
fn probe_natural_size(path: &Path) -> Option<Size> {
    match image::image_dimensions(path) {
        Ok((w, h)) => Some(Size::new(w as f32, h as f32)),
        Err(e) => {
            log::debug!("Could not read image size of '{}': {}", path.display(), e);
            None
        }
    }
}

impl AssetResolver for FilesystemAssetResolver {
    fn resolve(&self, reference: &str) -> Option<ResolvedAsset> {
        let reference = reference.trim();
        if reference.is_empty() {
            return None;
        }
        let candidates = extension_candidates(reference, self.extension_fallback);
        let found = candidates.iter().find_map(|c| self.existing_file(c));
        match found {
            Some(path) => {
                if !path.ends_with(reference) {
                    log::debug!(
                        "Asset '{}' resolved through extension fallback to '{}'.",
                        reference,
                        path.display()
                    );
                }
                let natural_size = probe_natural_size(&path);
                Some(ResolvedAsset { path, natural_size })
            }
            None => {
                log::debug!("Asset '{}' not found (tried {:?}).", reference, candidates);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "FilesystemAssetResolver"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn resolves_existing_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("chart.png"), b"not really a png").unwrap();

        let resolver = FilesystemAssetResolver::new(dir.path());
        let asset = resolver.resolve("chart.png").unwrap();
        assert!(asset.path.ends_with("chart.png"));
        // Header is garbage, so no size can be probed.
        assert_eq!(asset.natural_size, None);
    }

    #[test]
    fn falls_back_through_extensions() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("figure.jpeg"), b"x").unwrap();

        let resolver = FilesystemAssetResolver::new(dir.path());
        let asset = resolver.resolve("figure.jpg").unwrap();
        assert!(asset.path.ends_with("figure.jpeg"));

        let strict = FilesystemAssetResolver::new(dir.path()).with_extension_fallback(false);
        assert!(strict.resolve("figure.jpg").is_none());
    }

    #[test]
    fn blocks_path_traversal() {
        let dir = tempdir().unwrap();
        let inner = dir.path().join("assets");
        fs::create_dir(&inner).unwrap();
        fs::write(dir.path().join("secret.png"), b"x").unwrap();

        let resolver = FilesystemAssetResolver::new(&inner);
        assert!(resolver.resolve("../secret.png").is_none());
        assert!(resolver.resolve("").is_none());
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempdir().unwrap();
        let resolver = FilesystemAssetResolver::new(dir.path());
        assert!(resolver.resolve("nothing.png").is_none());
        assert_eq!(resolver.name(), "FilesystemAssetResolver");
    }
}
