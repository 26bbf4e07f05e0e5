//! Client configuration.
//!
//! All fields have defaults matching the stock backend and editor behavior, so
//! an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default address of the RAW processing backend.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// RAW extensions accepted for upload (lower case, without dot).
pub const RAW_EXTENSIONS: [&str; 4] = ["nef", "cr2", "arw", "dng"];

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration could not be parsed.
    #[error("Invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value is out of its allowed range.
    #[error("Invalid value for {field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },
}

/// Settings of the upload/preview/crop client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the processing backend, without trailing slash.
    pub base_url: String,
    /// Accepted upload extensions, compared case-insensitively.
    pub accepted_extensions: Vec<String>,
    /// Fraction of the source dimensions covered by the default crop box (0 < f <= 1).
    pub default_crop_fraction: f64,
    /// Keyboard nudge distance in source pixels.
    pub nudge_step: u32,
    /// Keyboard nudge distance with the modifier key held.
    pub nudge_step_large: u32,
    /// Minimum crop view zoom (screen pixels per source pixel).
    pub min_zoom: f64,
    /// Maximum crop view zoom.
    pub max_zoom: f64,
    /// Multiplicative zoom step for zoom in/out (e.g. 1.1 = 10% per step).
    pub zoom_step: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            accepted_extensions: RAW_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            default_crop_fraction: 0.8,
            nudge_step: 1,
            nudge_step_large: 10,
            min_zoom: 0.05,
            max_zoom: 8.0,
            zoom_step: 1.1,
        }
    }
}

impl ClientConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a configuration from JSON.
    ///
    /// Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ClientConfig = serde_json::from_str(json)?;
        config.validated()
    }

    /// Check value ranges, returning the configuration unchanged if valid.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if !(self.default_crop_fraction > 0.0 && self.default_crop_fraction <= 1.0) {
            return Err(ConfigError::OutOfRange {
                field: "default_crop_fraction",
                reason: format!("{} is not in (0, 1]", self.default_crop_fraction),
            });
        }
        if self.nudge_step == 0 || self.nudge_step_large == 0 {
            return Err(ConfigError::OutOfRange {
                field: "nudge_step",
                reason: "nudge steps must be at least 1 pixel".to_string(),
            });
        }
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(ConfigError::OutOfRange {
                field: "min_zoom",
                reason: format!(
                    "expected 0 < min_zoom <= max_zoom, got {} and {}",
                    self.min_zoom, self.max_zoom
                ),
            });
        }
        if self.zoom_step <= 1.0 {
            return Err(ConfigError::OutOfRange {
                field: "zoom_step",
                reason: format!("{} must be greater than 1", self.zoom_step),
            });
        }
        if self.accepted_extensions.is_empty() {
            return Err(ConfigError::OutOfRange {
                field: "accepted_extensions",
                reason: "at least one extension is required".to_string(),
            });
        }
        Ok(self)
    }

    /// Whether `extension` (without dot, any case) is accepted for upload.
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.accepted_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::new();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.clone().validated().is_ok());
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = ClientConfig::from_json("{}").unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_partial_json_overrides() {
        let config =
            ClientConfig::from_json(r#"{"base_url": "https://raw.example", "nudge_step_large": 25}"#)
                .unwrap();
        assert_eq!(config.base_url, "https://raw.example");
        assert_eq!(config.nudge_step_large, 25);
        assert_eq!(config.nudge_step, 1);
    }

    #[test]
    fn test_rejects_bad_fraction() {
        let err = ClientConfig::from_json(r#"{"default_crop_fraction": 1.5}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::OutOfRange {
                field: "default_crop_fraction",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_inverted_zoom_bounds() {
        let err = ClientConfig::from_json(r#"{"min_zoom": 4.0, "max_zoom": 2.0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "min_zoom", .. }));
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(matches!(
            ClientConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_accepts_extension_case_insensitive() {
        let config = ClientConfig::default();
        assert!(config.accepts_extension("nef"));
        assert!(config.accepts_extension("NEF"));
        assert!(config.accepts_extension("Dng"));
        assert!(!config.accepts_extension("jpg"));
        assert!(!config.accepts_extension(""));
    }
}
