//! Style defaults applied to newly created ROIs, loadable from a JSON file.

use crate::Result;
use crate::common::Color;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoiDefaults {
    pub name: String,
    pub color: Color,
    /// Fill opacity in `[0, 1]`
    pub opacity: f64,
    /// Stroke width in canvas pixels
    pub stroke: f64,
}

impl Default for RoiDefaults {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: Color::GREEN,
            opacity: 0.3,
            stroke: 2.0,
        }
    }
}

impl RoiDefaults {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let mut defaults: Self = serde_json::from_str(text)?;
        defaults.opacity = defaults.opacity.clamp(0.0, 1.0);
        Ok(defaults)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read ROI defaults {}: {e}", path.display()))?;
        Self::from_json_str(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let defaults = RoiDefaults::from_json_str(r#"{ "stroke": 4.5 }"#).unwrap();
        assert_relative_eq!(defaults.stroke, 4.5);
        assert_relative_eq!(defaults.opacity, 0.3);
        assert_eq!(defaults.color, Color::GREEN);
    }

    #[test]
    fn full_document() {
        let text = r#"{
            "name": "cell",
            "color": { "r": 255, "g": 0, "b": 0, "a": 255 },
            "opacity": 1.7,
            "stroke": 1.0
        }"#;
        let defaults = RoiDefaults::from_json_str(text).unwrap();
        assert_eq!(defaults.name, "cell");
        assert_eq!(defaults.color, Color::RED);
        assert_relative_eq!(defaults.opacity, 1.0);
    }

    #[test]
    fn malformed_document_is_an_error() {
        assert!(RoiDefaults::from_json_str("{ \"stroke\": \"wide\" }").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = RoiDefaults::load(Path::new("/nonexistent/roi_defaults.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
