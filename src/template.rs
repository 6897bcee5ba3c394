//! Page geometry and styles a run starts from.

use crate::error::PipelineError;
use galley_layout::{LayoutState, PartialLayout};
use galley_style::StyleCatalog;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Template {
    /// Page layout; missing fields come from Letter portrait with one-inch
    /// margins.
    #[serde(alias = "page")]
    pub layout: PartialLayout,
    pub styles: StyleCatalog,
}

impl Template {
    pub fn from_json(source: &str) -> Result<Self, PipelineError> {
        Ok(serde_json::from_str(source)?)
    }

    /// Loads the template at `path`. A configured template that does not
    /// exist is fatal; without one the built-in defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, PipelineError> {
        let Some(path) = path else {
            log::info!("No template configured; using Letter portrait defaults.");
            return Ok(Self::default());
        };
        if !path.is_file() {
            return Err(PipelineError::TemplateMissing(path.to_path_buf()));
        }
        let source = fs::read_to_string(path)?;
        let template = Self::from_json(&source)?;
        log::info!("Loaded template '{}'.", path.display());
        Ok(template)
    }

    pub fn default_layout(&self) -> LayoutState {
        self.layout.resolve(&LayoutState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use galley_layout::Orientation;

    #[test]
    fn defaults_to_letter_portrait() {
        let layout = Template::load(None).unwrap().default_layout();
        assert_eq!((layout.width, layout.height), (612.0, 792.0));
        assert_eq!(layout.margins.left, 72.0);
        assert_eq!(layout.orientation, Orientation::Portrait);
    }

    #[test]
    fn missing_template_is_fatal() {
        let err = Template::load(Some(Path::new("/nonexistent/template.json"))).unwrap_err();
        assert!(matches!(err, PipelineError::TemplateMissing(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn reads_layout_and_styles() {
        let template = Template::from_json(
            r#"{
                "page": {"orientation": "landscape", "margins": {"top": "0.5in", "bottom": 36, "left": 36, "right": 36}},
                "styles": {"paragraph": {"styles": [{"name": "Body", "pointSize": 10}]}}
            }"#,
        )
        .unwrap();
        let layout = template.default_layout();
        assert_eq!((layout.width, layout.height), (792.0, 612.0));
        assert_eq!(layout.margins.top, 36.0);
        assert!(template.styles.find_paragraph("body").is_some());
    }
}
