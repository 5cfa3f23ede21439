//! The [`Config`] struct and its validation.

use crate::defaults;
use crate::error::ConfigError;
use crate::types::{Anchor, ExclusiveZone, LogLevel, SourceConfig};
use serde::{Deserialize, Serialize};

/// Largest bar height accepted from configuration, in pixels.
pub const MAX_HEIGHT: u32 = 4096;

/// Largest bar width accepted from configuration, in pixels.
pub const MAX_WIDTH: u32 = 16384;

/// Bar configuration.
///
/// Loaded once at startup; nothing here is reloaded at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Font descriptor, e.g. `"JetBrains Mono:size=11"` or `"monospace:pixelsize=14"`
    #[serde(default = "defaults::font")]
    pub font: String,

    /// Resolution used to convert point sizes to pixels
    #[serde(default = "defaults::dpi")]
    pub dpi: f32,

    /// Text colour [R, G, B, A] (0-255, straight alpha)
    #[serde(default = "defaults::foreground")]
    pub foreground: [u8; 4],

    /// Bar height in pixels (0 = ascent + descent of the font)
    #[serde(default)]
    pub height: u32,

    /// Bar width in pixels (0 = let the surface decide)
    #[serde(default)]
    pub width: u32,

    /// Screen edge the bar is anchored to
    #[serde(default)]
    pub anchor: Anchor,

    /// Screen space reserved by the bar
    #[serde(default)]
    pub exclusive_zone: ExclusiveZone,

    /// External text source
    #[serde(default)]
    pub source: SourceConfig,

    /// Log level (overridden by `RUST_LOG` and `--log-level`)
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font: defaults::font(),
            dpi: defaults::dpi(),
            foreground: defaults::foreground(),
            height: 0,
            width: 0,
            anchor: Anchor::default(),
            exclusive_zone: ExclusiveZone::default(),
            source: SourceConfig::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl Config {
    /// Check field values that deserialize fine but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.font.trim().is_empty() {
            return Err(ConfigError::Validation(
                "font: descriptor must not be empty".to_string(),
            ));
        }
        if !self.dpi.is_finite() || self.dpi <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "dpi: must be a positive number, got {}",
                self.dpi
            )));
        }
        if self.height > MAX_HEIGHT {
            return Err(ConfigError::Validation(format!(
                "height: {} exceeds the maximum of {MAX_HEIGHT}",
                self.height
            )));
        }
        if self.width > MAX_WIDTH {
            return Err(ConfigError::Validation(format!(
                "width: {} exceeds the maximum of {MAX_WIDTH}",
                self.width
            )));
        }
        if self.source.command.trim().is_empty() {
            return Err(ConfigError::Validation(
                "source.command: must not be empty".to_string(),
            ));
        }
        if self.source.respawn_interval_ms == Some(0) {
            return Err(ConfigError::Validation(
                "source.respawn_interval_ms: must be greater than zero (use null to run once)"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
