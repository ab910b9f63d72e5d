//! Configuration management for Engelism.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Provider credentials are not stored here: they come from the
//! `.env` file named by `general.env_file`.

mod types;
mod validate;

pub use types::*;
pub use validate::MAX_CONCURRENCY;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Engelism.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Input and output locations
    pub general: GeneralConfig,

    /// Batch fabrication settings
    pub batch: BatchConfig,

    /// Provider call settings
    pub llm: LlmConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.engelism.engelism/config.toml
    /// - Linux: ~/.config/engelism/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\engelism\config\config.toml
    ///
    /// Falls back to ~/.engelism/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "engelism", "engelism")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                PathBuf::from(home).join(".engelism").join("config.toml")
            })
    }

    /// Resolved catalog path (with ~ expansion).
    pub fn library_path(&self) -> PathBuf {
        expand(&self.general.library_path)
    }

    /// Resolved `.env` path (with ~ expansion).
    pub fn env_file(&self) -> PathBuf {
        expand(&self.general.env_file)
    }

    /// Resolved batch configuration path (with ~ expansion).
    pub fn batch_config_path(&self) -> PathBuf {
        expand(&self.general.batch_config)
    }

    /// Resolved artifact directory (with ~ expansion).
    pub fn output_dir(&self) -> PathBuf {
        expand(&self.general.output_dir)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

fn expand(path: &Path) -> PathBuf {
    let path_str = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(&path_str).into_owned())
}
