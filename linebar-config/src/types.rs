//! Enumerations and small value types used by [`crate::Config`].

use serde::{Deserialize, Serialize};

/// Screen edge the bar is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    /// Bar at the top of the output (default)
    #[default]
    Top,
    /// Bar at the bottom of the output
    Bottom,
}

impl Anchor {
    /// Display name for logs and CLI help
    pub fn display_name(&self) -> &'static str {
        match self {
            Anchor::Top => "top",
            Anchor::Bottom => "bottom",
        }
    }
}

/// How much screen space the bar reserves so other surfaces do not cover it.
///
/// In YAML this is written as `off`, `bar_height` or a pixel count such as `24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "ZoneRepr", into = "ZoneRepr")]
pub enum ExclusiveZone {
    /// Reserve nothing; the bar floats over or under other surfaces
    #[default]
    Off,
    /// Reserve exactly the configured (rendered) bar height
    BarHeight,
    /// Reserve a fixed number of pixels regardless of bar height
    Fixed(u32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ZoneRepr {
    Pixels(u32),
    Named(String),
}

impl TryFrom<ZoneRepr> for ExclusiveZone {
    type Error = String;

    fn try_from(repr: ZoneRepr) -> Result<Self, Self::Error> {
        match repr {
            ZoneRepr::Pixels(px) => Ok(ExclusiveZone::Fixed(px)),
            ZoneRepr::Named(name) => match name.as_str() {
                "off" => Ok(ExclusiveZone::Off),
                "bar_height" => Ok(ExclusiveZone::BarHeight),
                other => Err(format!(
                    "unknown exclusive_zone '{other}' (expected off, bar_height or a pixel count)"
                )),
            },
        }
    }
}

impl From<ExclusiveZone> for ZoneRepr {
    fn from(zone: ExclusiveZone) -> Self {
        match zone {
            ExclusiveZone::Off => ZoneRepr::Named("off".to_string()),
            ExclusiveZone::BarHeight => ZoneRepr::Named("bar_height".to_string()),
            ExclusiveZone::Fixed(px) => ZoneRepr::Pixels(px),
        }
    }
}

impl ExclusiveZone {
    /// Resolve the reserved size for a bar of the given height.
    pub fn resolve(self, bar_height: u32) -> i32 {
        let zone = match self {
            ExclusiveZone::Off => 0,
            ExclusiveZone::BarHeight => bar_height,
            ExclusiveZone::Fixed(px) => px,
        };
        i32::try_from(zone).unwrap_or(i32::MAX)
    }
}

/// Log level from the config file.
///
/// `RUST_LOG` and the `--log-level` CLI flag take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No logging
    #[default]
    Off,
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Most verbose
    Trace,
}

impl LogLevel {
    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// The external line-oriented text source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Shell command whose stdout lines are displayed (run with `sh -c`)
    #[serde(default = "crate::defaults::source_command")]
    pub command: String,

    /// Re-run the command this many milliseconds after it exits.
    /// `null` runs it once and keeps showing the last line.
    #[serde(default = "crate::defaults::respawn_interval_ms")]
    pub respawn_interval_ms: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            command: crate::defaults::source_command(),
            respawn_interval_ms: crate::defaults::respawn_interval_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusive_zone_resolve() {
        assert_eq!(ExclusiveZone::Off.resolve(22), 0);
        assert_eq!(ExclusiveZone::BarHeight.resolve(22), 22);
        assert_eq!(ExclusiveZone::Fixed(30).resolve(22), 30);
    }

    #[test]
    fn test_exclusive_zone_resolve_saturates() {
        assert_eq!(ExclusiveZone::Fixed(u32::MAX).resolve(0), i32::MAX);
    }

    #[test]
    fn test_exclusive_zone_yaml_forms() {
        let off: ExclusiveZone = serde_yaml_ng::from_str("off").unwrap();
        let bar: ExclusiveZone = serde_yaml_ng::from_str("bar_height").unwrap();
        let fixed: ExclusiveZone = serde_yaml_ng::from_str("12").unwrap();
        assert_eq!(off, ExclusiveZone::Off);
        assert_eq!(bar, ExclusiveZone::BarHeight);
        assert_eq!(fixed, ExclusiveZone::Fixed(12));
    }

    #[test]
    fn test_exclusive_zone_rejects_unknown_name() {
        let result: Result<ExclusiveZone, _> = serde_yaml_ng::from_str("sometimes");
        assert!(result.is_err());
    }

    #[test]
    fn test_exclusive_zone_serializes_back() {
        let yaml = serde_yaml_ng::to_string(&ExclusiveZone::BarHeight).unwrap();
        assert_eq!(yaml.trim(), "bar_height");
        let yaml = serde_yaml_ng::to_string(&ExclusiveZone::Fixed(7)).unwrap();
        assert_eq!(yaml.trim(), "7");
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LogLevel::Off.to_level_filter(), log::LevelFilter::Off);
        assert_eq!(LogLevel::Warn.to_level_filter(), log::LevelFilter::Warn);
        assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
    }
}
