//! Command-line interface for linebar.
//!
//! This module handles CLI argument parsing, the overrides applied on top of
//! the config file, and the `default-config` subcommand.

use clap::{Parser, Subcommand};
use linebar_config::{Anchor, Config};
use log::LevelFilter;
use std::path::PathBuf;

/// linebar - A single-line text bar fed by an external line stream
#[derive(Parser, Debug)]
#[command(name = "linebar")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub subcommand: Option<Commands>,

    /// Config file to use instead of ~/.config/linebar/config.yaml
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Font descriptor, e.g. "monospace:size=11"
    #[arg(long, value_name = "DESCRIPTOR")]
    pub font: Option<String>,

    /// Bar height in pixels (0 = font ascent + descent)
    #[arg(long, value_name = "PIXELS")]
    pub height: Option<u32>,

    /// Bar width in pixels (0 = let the surface choose)
    #[arg(long, value_name = "PIXELS")]
    pub width: Option<u32>,

    /// Screen edge to anchor the bar to
    #[arg(long, value_name = "EDGE", value_parser = parse_anchor)]
    pub anchor: Option<Anchor>,

    /// Shell command whose output lines are shown
    #[arg(long, value_name = "COMMAND", conflicts_with = "stdin")]
    pub command: Option<String>,

    /// Read lines from standard input instead of running a command
    #[arg(long)]
    pub stdin: bool,

    /// Run the command once instead of re-running it after it exits
    #[arg(long)]
    pub once: bool,

    /// Write every presented frame to this PNG file
    #[arg(long, value_name = "PATH")]
    pub snapshot: Option<PathBuf>,

    /// Close the bar after presenting this many frames
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,

    /// Log level (off, error, warn, info, debug, trace); overrides RUST_LOG
    /// and the config file
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<LevelFilter>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the default configuration as YAML and exit
    DefaultConfig,
}

fn parse_anchor(value: &str) -> Result<Anchor, String> {
    match value.to_ascii_lowercase().as_str() {
        "top" => Ok(Anchor::Top),
        "bottom" => Ok(Anchor::Bottom),
        other => Err(format!("unknown anchor '{other}' (expected top or bottom)")),
    }
}

/// Runtime options passed from CLI to the application
#[derive(Clone, Debug, Default)]
pub struct RuntimeOptions {
    /// Explicit config file
    pub config: Option<PathBuf>,
    /// Font descriptor override
    pub font: Option<String>,
    /// Height override
    pub height: Option<u32>,
    /// Width override
    pub width: Option<u32>,
    /// Anchor override
    pub anchor: Option<Anchor>,
    /// Source command override
    pub command: Option<String>,
    /// Read stdin instead of a command
    pub stdin: bool,
    /// Disable respawning
    pub once: bool,
    /// PNG path for frame snapshots
    pub snapshot: Option<PathBuf>,
    /// Frame limit for the headless surface
    pub frames: Option<u64>,
    /// CLI log level (highest precedence)
    pub log_level: Option<LevelFilter>,
}

impl RuntimeOptions {
    /// Apply the CLI overrides on top of a loaded config.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(ref font) = self.font {
            config.font = font.clone();
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(anchor) = self.anchor {
            config.anchor = anchor;
        }
        if let Some(ref command) = self.command {
            config.source.command = command.clone();
        }
        if self.once {
            config.source.respawn_interval_ms = None;
        }
    }
}

impl From<Cli> for RuntimeOptions {
    fn from(cli: Cli) -> Self {
        RuntimeOptions {
            config: cli.config,
            font: cli.font,
            height: cli.height,
            width: cli.width,
            anchor: cli.anchor,
            command: cli.command,
            stdin: cli.stdin,
            once: cli.once,
            snapshot: cli.snapshot,
            frames: cli.frames,
            log_level: cli.log_level,
        }
    }
}

/// Result of CLI processing
pub enum CliResult {
    /// Continue with normal application startup
    Continue(RuntimeOptions),
    /// Exit with the given code (subcommand completed)
    Exit(i32),
}

/// Process CLI arguments and handle subcommands
pub fn process_cli() -> CliResult {
    process(Cli::parse())
}

fn process(cli: Cli) -> CliResult {
    match cli.subcommand {
        Some(Commands::DefaultConfig) => match serde_yaml_ng::to_string(&Config::default()) {
            Ok(yaml) => {
                print!("{yaml}");
                CliResult::Exit(0)
            }
            Err(e) => {
                eprintln!("linebar: error: {e}");
                CliResult::Exit(1)
            }
        },
        None => CliResult::Continue(RuntimeOptions::from(cli)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("linebar").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = parse(&[
            "--font",
            "Hack:pixelsize=14",
            "--height",
            "24",
            "--anchor",
            "bottom",
            "--command",
            "uptime",
            "--once",
        ]);
        let options = RuntimeOptions::from(cli);
        let mut config = Config::default();
        options.apply_to(&mut config);

        assert_eq!(config.font, "Hack:pixelsize=14");
        assert_eq!(config.height, 24);
        assert_eq!(config.width, 0);
        assert_eq!(config.anchor, Anchor::Bottom);
        assert_eq!(config.source.command, "uptime");
        assert_eq!(config.source.respawn_interval_ms, None);
    }

    #[test]
    fn test_no_flags_keeps_config() {
        let options = RuntimeOptions::from(parse(&[]));
        let mut config = Config::default();
        options.apply_to(&mut config);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_log_level_flag() {
        let cli = parse(&["--log-level", "debug"]);
        assert_eq!(cli.log_level, Some(LevelFilter::Debug));
    }

    #[test]
    fn test_log_level_parse_errors_are_reported() {
        assert_eq!(parse(&["--log-level", "WARN"]).log_level, Some(LevelFilter::Warn));

        let err = Cli::try_parse_from(["linebar", "--log-level", "loud"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(err.to_string().contains("loud"));
    }

    #[test]
    fn test_bad_anchor_is_rejected() {
        assert!(Cli::try_parse_from(["linebar", "--anchor", "left"]).is_err());
    }

    #[test]
    fn test_stdin_conflicts_with_command() {
        assert!(
            Cli::try_parse_from(["linebar", "--stdin", "--command", "date"]).is_err()
        );
    }

    #[test]
    fn test_default_config_subcommand_exits() {
        let cli = parse(&["default-config"]);
        assert!(matches!(process(cli), CliResult::Exit(0)));
    }
}
