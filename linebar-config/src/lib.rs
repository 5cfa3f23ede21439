//! Configuration system for the linebar text bar.
//!
//! This crate provides configuration loading, saving, validation and default
//! values. It includes:
//!
//! - The font descriptor and foreground colour used by the compositor
//! - Bar geometry requests (height, width, anchor edge, exclusive zone)
//! - The external text source (shell command and respawn policy)
//! - The log level applied once the configuration is loaded

pub mod config;
pub mod defaults;
mod error;
mod persistence;
mod types;

pub use config::Config;
pub use error::ConfigError;
pub use types::{Anchor, ExclusiveZone, LogLevel, SourceConfig};
