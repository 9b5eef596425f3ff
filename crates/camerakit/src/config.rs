//! Camera configuration.
//!
//! Every option has a default, so an empty file (or no file at all) yields a
//! usable configuration:
//!
//! ```toml
//! facing = "front"
//! flash = "auto"
//! jpeg_quality = 85
//! crop_output = true
//!
//! [runtime]
//! crop_workers = 4
//! lifecycle_timeout_ms = 3000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CaptureSettings, Facing, Flash, Focus, Method, Zoom};

/// Camera options recognized by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub facing: Facing,
    pub flash: Flash,
    pub focus: Focus,
    pub method: Method,
    pub zoom: Zoom,
    /// JPEG quality for re-encoded stills (0-100)
    pub jpeg_quality: u8,
    /// Crop stills to the preview surface's aspect ratio
    pub crop_output: bool,
    /// Let the preview surface size itself to the preview aspect ratio
    pub adjust_view_bounds: bool,
    pub runtime: RuntimeConfig,
}

/// Threading and timing knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Threads in the still post-processing pool
    pub crop_workers: usize,
    /// Upper bound on waiting for the camera thread during start/stop
    pub lifecycle_timeout_ms: u64,
    /// Extra degrees a sensor reading must move past the midpoint between
    /// two orientations before the reported orientation changes
    pub orientation_hysteresis: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: Facing::default(),
            flash: Flash::default(),
            focus: Focus::default(),
            method: Method::default(),
            zoom: Zoom::default(),
            jpeg_quality: 100,
            crop_output: false,
            adjust_view_bounds: false,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            crop_workers: 2,
            lifecycle_timeout_ms: 5_000,
            orientation_hysteresis: 5,
        }
    }
}

impl CameraConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CameraConfig = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file path.
    /// Returns the default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(CameraConfig::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: CameraConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ParseFile {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that the type system doesn't.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jpeg_quality > 100 {
            return Err(ConfigError::Invalid(format!(
                "jpeg_quality must be between 0 and 100, got {}",
                self.jpeg_quality
            )));
        }
        if self.runtime.crop_workers == 0 {
            return Err(ConfigError::Invalid(
                "runtime.crop_workers must be at least 1".to_string(),
            ));
        }
        if self.runtime.orientation_hysteresis >= 45 {
            return Err(ConfigError::Invalid(format!(
                "runtime.orientation_hysteresis must be below 45 degrees, got {}",
                self.runtime.orientation_hysteresis
            )));
        }
        Ok(())
    }

    pub fn lifecycle_timeout(&self) -> Duration {
        Duration::from_millis(self.runtime.lifecycle_timeout_ms)
    }

    /// The capture settings this configuration starts the controller with.
    pub fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            facing: self.facing,
            flash: self.flash,
            focus: self.focus,
            zoom: self.zoom,
            method: self.method,
            jpeg_quality: self.jpeg_quality,
            crop_output: self.crop_output,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    ParseFile {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = CameraConfig::from_toml_str("").unwrap();
        assert_eq!(config, CameraConfig::default());
        assert_eq!(config.jpeg_quality, 100);
        assert!(!config.crop_output);
        assert!(!config.adjust_view_bounds);
        assert_eq!(config.lifecycle_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_all_options() {
        let config = CameraConfig::from_toml_str(
            r#"
            facing = "front"
            flash = "auto"
            focus = "tap"
            method = "fast"
            zoom = "pinch"
            jpeg_quality = 80
            crop_output = true
            adjust_view_bounds = true

            [runtime]
            crop_workers = 4
            lifecycle_timeout_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.facing, Facing::Front);
        assert_eq!(config.flash, Flash::Auto);
        assert_eq!(config.focus, Focus::Tap);
        assert_eq!(config.method, Method::Fast);
        assert_eq!(config.zoom, Zoom::Pinch);
        assert_eq!(config.jpeg_quality, 80);
        assert!(config.crop_output);
        assert!(config.adjust_view_bounds);
        assert_eq!(config.runtime.crop_workers, 4);
        assert_eq!(config.runtime.orientation_hysteresis, 5);
        assert_eq!(config.lifecycle_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_quality_out_of_range() {
        let result = CameraConfig::from_toml_str("jpeg_quality = 101");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unknown_enum_value() {
        let result = CameraConfig::from_toml_str(r#"flash = "strobe""#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = CameraConfig::from_toml_str("[runtime]\ncrop_workers = 0");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CameraConfig::load(&dir.path().join("camera.toml")).unwrap();
        assert_eq!(config, CameraConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "facing = \"front\"\ncrop_output = true").unwrap();

        let config = CameraConfig::load(file.path()).unwrap();
        assert_eq!(config.facing, Facing::Front);
        assert!(config.crop_output);
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "jpeg_quality = \"high\"").unwrap();

        let err = CameraConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_capture_settings_mirror_config() {
        let mut config = CameraConfig::default();
        config.facing = Facing::Front;
        config.jpeg_quality = 42;
        let settings = config.capture_settings();
        assert_eq!(settings.facing, Facing::Front);
        assert_eq!(settings.jpeg_quality, 42);
    }
}
