//! Config persistence and path resolution for [`Config`].
//!
//! Covers `load` / `save` (YAML file I/O with atomic write) and the
//! XDG-style path helpers.

use crate::config::Config;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// Load configuration from the default path, creating it with defaults
    /// when it does not exist yet.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        log::info!("Config path: {:?}", config_path);

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            log::info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            if let Err(e) = config.save_to(&config_path) {
                // A read-only home should not keep the bar from starting.
                log::warn!("Failed to save default config: {:#}", e);
            }
            Ok(config)
        }
    }

    /// Load and validate configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        log::info!("Loading config from {:?}", path);
        let contents = fs::read_to_string(path)
            .map_err(ConfigError::from)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_yaml_ng::from_str(&contents)
            .map_err(ConfigError::from)
            .with_context(|| format!("parsing {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::from)?;
        }

        let yaml = serde_yaml_ng::to_string(self).map_err(ConfigError::from)?;

        // Write to a temp file then rename so a crash never leaves half a file
        let temp_path = path.with_extension("yaml.tmp");
        fs::write(&temp_path, &yaml).map_err(ConfigError::from)?;
        fs::rename(&temp_path, path).map_err(ConfigError::from)?;

        Ok(())
    }

    /// Get the configuration directory (`~/.config/linebar`)
    pub fn config_dir() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("linebar")
        } else if let Some(home_dir) = dirs::home_dir() {
            home_dir.join(".config").join("linebar")
        } else {
            PathBuf::from(".")
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.yaml")
    }
}
