//! Configuration module for peekr
//!
//! Manages preview limits, the viewer bundle location and cache sizing.
//! Configuration is stored in the user's config directory and can be
//! overridden with `PEEKR__SECTION__KEY` environment variables.

use crate::preview::{PreviewLimits, ViewerConfig};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Session cache sizing
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached previews; unbounded when unset
    pub max_entries: Option<u64>,
}

/// Application configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
#[serde(default)]
pub struct PeekrConfig {
    /// Size and rendering caps
    pub limits: PreviewLimits,

    /// Where the point-cloud viewer bundle is published
    pub viewer: ViewerConfig,

    /// Preview cache sizing
    pub cache: CacheConfig,
}

impl PeekrConfig {
    /// Get the path to the config file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the system config directory cannot be determined.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            ConfigError::Message("Could not determine config directory".to_string())
        })?;

        Ok(config_dir.join("peekr").join("config.toml"))
    }

    /// Load configuration from the default location
    ///
    /// A missing file is not an error; defaults and environment overrides
    /// still apply.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be parsed or the resulting
    /// limits are invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be parsed or the resulting
    /// limits are invalid.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(
                File::from(path.to_path_buf())
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix("PEEKR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for inconsistent values
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the limits are invalid or the cache capacity
    /// is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.limits
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        if self.cache.max_entries == Some(0) {
            return Err(ConfigError::Message(
                "cache.max_entries must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Save configuration to the default location
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the config directory cannot be created, the configuration
    /// cannot be serialized to TOML, or the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the parent directory cannot be created, the
    /// configuration cannot be serialized to TOML, or the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::Message(format!("Failed to serialize config: {e}")))?;

        fs::write(path, toml_string)
            .map_err(|e| ConfigError::Message(format!("Failed to write config file: {e}")))?;

        Ok(())
    }
}
