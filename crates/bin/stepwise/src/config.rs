//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `stepwise.toml` in the working directory unless another path
//! is given. Every field has a sensible default so the file is optional.
//! Environment variables take precedence over file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Default location of the configuration file.
pub const DEFAULT_PATH: &str = "stepwise.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interpreter settings.
    pub runner: RunnerConfig,
    /// Where automations are stored.
    pub storage: StorageConfig,
    /// Bounds of the virtual screen.
    pub screen: ScreenConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Interpreter configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Delay applied before every step, in milliseconds.
    pub step_delay_ms: u64,
}

/// Automation storage configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding one JSON file per automation.
    pub automations_dir: PathBuf,
}

/// Virtual screen configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: u64,
    pub height: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `path` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is malformed or invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(delay) = var("STEPWISE_STEP_DELAY_MS").and_then(|val| val.parse().ok()) {
            self.runner.step_delay_ms = delay;
        }
        if let Some(val) = var("STEPWISE_AUTOMATIONS_DIR") {
            self.storage.automations_dir = PathBuf::from(val);
        }
        if let Some(val) = var("STEPWISE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.screen.width == 0 || self.screen.height == 0 {
            return Err(ConfigError::Validation(
                "screen width and height must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Delay applied before every step.
    #[must_use]
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.runner.step_delay_ms)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            automations_dir: PathBuf::from("automations"),
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "stepwise=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
