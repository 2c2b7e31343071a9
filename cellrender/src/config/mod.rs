//! Configuration for output rendering.
//!
//! Every section has serde defaults, so an empty JSON object is a valid
//! configuration.

use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level rendering configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Script activation settings.
    #[serde(default)]
    pub activation: ActivationConfig,
    /// Height estimation settings.
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LogConfig,
}

impl RenderConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a configuration from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Sets the remote script load timeout.
    #[must_use]
    pub fn with_load_timeout(mut self, seconds: f64) -> Self {
        self.activation.load_timeout_seconds = Some(seconds);
        self
    }

    /// Sets the log level directive.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// Checks that all values are in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(seconds) = self.activation.load_timeout_seconds {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(ConfigError::invalid(
                    "activation.load_timeout_seconds",
                    "must be a positive number of seconds",
                ));
            }
        }
        if !self.layout.line_height_px.is_finite() || self.layout.line_height_px <= 0.0 {
            return Err(ConfigError::invalid("layout.line_height_px", "must be positive"));
        }
        if !self.layout.image_height_px.is_finite() || self.layout.image_height_px < 0.0 {
            return Err(ConfigError::invalid("layout.image_height_px", "must not be negative"));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid("logging.level", "must not be empty"));
        }
        Ok(())
    }
}

/// Script activation settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationConfig {
    /// Upper bound on waiting for a remote script's load signal. A timeout
    /// is treated like a load error. `None` waits indefinitely.
    #[serde(default)]
    pub load_timeout_seconds: Option<f64>,
}

impl ActivationConfig {
    /// Returns the load timeout as a duration.
    #[must_use]
    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_seconds
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(Duration::from_secs_f64)
    }
}

/// Metrics used by the block layout height estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Height of one line of text in pixels.
    #[serde(default = "default_line_height")]
    pub line_height_px: f64,
    /// Height assumed for images and other replaced elements without an
    /// explicit `height` attribute.
    #[serde(default = "default_image_height")]
    pub image_height_px: f64,
}

fn default_line_height() -> f64 {
    20.0
}

fn default_image_height() -> f64 {
    240.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_height_px: default_line_height(),
            image_height_px: default_image_height(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
