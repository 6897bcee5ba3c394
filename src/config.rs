use crate::error::PipelineError;
use galley_layout::LayoutConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetConfig {
    /// Directory image references are resolved against.
    pub base_dir: Option<PathBuf>,
    /// Try `jpg`, `jpeg` and `png` siblings when a referenced image is missing.
    pub extension_fallback: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            extension_fallback: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressConfig {
    /// Seconds after which a progress line is written even without progress.
    pub heartbeat_secs: u64,
    /// Percentage points between progress lines.
    pub percent_step: u32,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: 10,
            percent_step: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogConfig {
    /// Append-only event log; stderr through `env_logger` when unset.
    pub file: Option<PathBuf>,
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: None,
            level: "info".to_string(),
        }
    }
}

/// Everything a run needs besides the template and the content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunConfig {
    pub layout: LayoutConfig,
    pub assets: AssetConfig,
    pub progress: ProgressConfig,
    pub log: LogConfig,
}

impl RunConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read run configuration '{}': {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&source)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_sections_keep_their_defaults() {
        let cfg: RunConfig = serde_json::from_str(
            r#"{"layout": {"stallLimit": 4}, "assets": {"baseDir": "img"}, "log": {"level": "debug"}}"#,
        )
        .unwrap();
        assert_eq!(cfg.layout.stall_limit, 4);
        assert_eq!(cfg.layout.safe_page_limit, 2000);
        assert_eq!(cfg.assets.base_dir, Some(PathBuf::from("img")));
        assert!(cfg.assets.extension_fallback);
        assert_eq!(cfg.progress.percent_step, 5);
        assert_eq!(cfg.log.level, "debug");
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        let err = RunConfig::from_file("/nonexistent/run.json").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
