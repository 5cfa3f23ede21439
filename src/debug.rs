/// Logging infrastructure for linebar
///
/// Every crate logs through the `log` facade. This module installs the one
/// `log::Log` implementation for the process:
/// - Lines are formatted as `[secs.micros] [LEVEL] [target] msg`
/// - Output goes to stderr, so a bar reading its own stdout stays unaffected
/// - When `LINEBAR_LOG_FILE` names a path, every line is mirrored there too
///
/// Level precedence: CLI `--log-level`, then `RUST_LOG`, then the config
/// file's `log_level` (applied once the config has loaded).
use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Environment variable naming a file that mirrors the log.
pub const LOG_FILE_ENV: &str = "LINEBAR_LOG_FILE";

struct LogSink {
    mirror: Option<File>,
}

impl LogSink {
    fn new() -> Self {
        let mirror = std::env::var_os(LOG_FILE_ENV).and_then(|path| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .ok()
        });
        LogSink { mirror }
    }

    fn write_line(&mut self, line: &str) {
        let _ = std::io::stderr().write_all(line.as_bytes());
        if let Some(ref mut file) = self.mirror {
            let _ = file.write_all(line.as_bytes());
            let _ = file.flush();
        }
    }
}

struct LogBridge;

static SINK: OnceLock<Mutex<LogSink>> = OnceLock::new();
static BRIDGE: LogBridge = LogBridge;
/// Set when the level came from the CLI or `RUST_LOG` and must not be
/// overridden by the config file.
static LEVEL_PINNED: AtomicBool = AtomicBool::new(false);

fn sink() -> &'static Mutex<LogSink> {
    SINK.get_or_init(|| Mutex::new(LogSink::new()))
}

fn get_timestamp() -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}.{:06}", now.as_secs(), now.subsec_micros())
}

/// Render one record in the bridge's line format.
pub fn format_line(timestamp: &str, record: &Record) -> String {
    format!(
        "[{}] [{:<5}] [{}] {}\n",
        timestamp,
        record.level(),
        record.target(),
        record.args()
    )
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format_line(&get_timestamp(), record);
        sink().lock().write_line(&line);
    }

    fn flush(&self) {
        if let Some(ref mut file) = sink().lock().mirror {
            let _ = file.flush();
        }
    }
}

/// Parse a `RUST_LOG` value. Only a bare level is understood; per-target
/// directives are ignored.
pub fn level_from_rust_log(value: &str) -> Option<LevelFilter> {
    value
        .split(',')
        .find(|directive| !directive.contains('='))
        .and_then(|level| level.trim().parse().ok())
}

/// Install the bridge. `cli_level` wins over `RUST_LOG`; when neither is
/// given logging stays off until [`apply_config_level`] runs.
pub fn init_log_bridge(cli_level: Option<LevelFilter>) {
    let env_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| level_from_rust_log(&v));
    let level = cli_level.or(env_level);
    LEVEL_PINNED.store(level.is_some(), Ordering::Relaxed);

    // A second call (tests) keeps the first logger
    if log::set_logger(&BRIDGE).is_ok() {
        log::set_max_level(level.unwrap_or(LevelFilter::Off));
    }
}

/// Apply the config file's level unless the CLI or environment chose one.
pub fn apply_config_level(level: LevelFilter) {
    if !LEVEL_PINNED.load(Ordering::Relaxed) {
        log::set_max_level(level);
    }
}
