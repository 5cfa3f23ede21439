//! The external text source.
//!
//! [`TextSource`] yields raw bytes from either a shell command's stdout or
//! the process's own stdin. A command that exits is reaped and, when a
//! respawn interval is configured, run again once the interval has passed,
//! which is how a clock command such as `date` keeps the bar updated.

use std::fs::File;
use std::io;
use std::os::fd::{AsFd, BorrowedFd};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::time::{Duration, Instant};

use linebar_config::SourceConfig;
use thiserror::Error;

use crate::line_reader::{Line, LineReader};

/// Errors from the text source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The shell could not be started
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The child was spawned without a stdout pipe
    #[error("'{0}' has no stdout pipe")]
    NoStdout(String),

    /// Duplicating stdin failed
    #[error("failed to open stdin: {0}")]
    Stdin(#[source] io::Error),
}

/// Where lines come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    /// `sh -c <command>`, optionally re-run after it exits
    Command {
        command: String,
        respawn: Option<Duration>,
    },
    /// The process's own standard input
    Stdin,
}

impl SourceKind {
    pub fn from_config(config: &SourceConfig) -> Self {
        SourceKind::Command {
            command: config.command.clone(),
            respawn: config.respawn_interval_ms.map(Duration::from_millis),
        }
    }
}

enum SourceState {
    /// Not started yet
    Idle,
    Running { child: Child, stdout: ChildStdout },
    Reading(File),
    /// Command exited; run it again at `until`
    Waiting { until: Instant },
    Finished,
}

/// A line-oriented byte stream feeding the bar.
pub struct TextSource {
    kind: SourceKind,
    state: SourceState,
    spawn_count: u64,
}

impl std::fmt::Debug for TextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            SourceState::Idle => "idle",
            SourceState::Running { .. } => "running",
            SourceState::Reading(_) => "reading",
            SourceState::Waiting { .. } => "waiting",
            SourceState::Finished => "finished",
        };
        f.debug_struct("TextSource")
            .field("kind", &self.kind)
            .field("state", &state)
            .field("spawn_count", &self.spawn_count)
            .finish()
    }
}

impl TextSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            state: SourceState::Idle,
            spawn_count: 0,
        }
    }

    pub fn command(command: impl Into<String>, respawn: Option<Duration>) -> Self {
        Self::new(SourceKind::Command {
            command: command.into(),
            respawn,
        })
    }

    pub fn stdin() -> Self {
        Self::new(SourceKind::Stdin)
    }

    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    /// How many times the command has been started.
    pub fn spawn_count(&self) -> u64 {
        self.spawn_count
    }

    /// True once the source will never produce bytes again.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, SourceState::Finished)
    }

    /// True while the source waits to re-run its command.
    pub fn is_waiting(&self) -> bool {
        matches!(self.state, SourceState::Waiting { .. })
    }

    /// Start producing bytes. A second call is a no-op.
    pub fn start(&mut self) -> Result<(), SourceError> {
        if !matches!(self.state, SourceState::Idle) {
            return Ok(());
        }
        self.state = match &self.kind {
            SourceKind::Command { command, .. } => {
                let (child, stdout) = spawn_shell(command)?;
                self.spawn_count += 1;
                SourceState::Running { child, stdout }
            }
            SourceKind::Stdin => {
                // Own a duplicate so reads bypass std's stdin buffer
                let fd = io::stdin()
                    .as_fd()
                    .try_clone_to_owned()
                    .map_err(SourceError::Stdin)?;
                log::info!("Reading lines from stdin");
                SourceState::Reading(File::from(fd))
            }
        };
        Ok(())
    }

    /// Descriptor to wait on for readability, if the source is producing.
    pub fn poll_fd(&self) -> Option<BorrowedFd<'_>> {
        match &self.state {
            SourceState::Running { stdout, .. } => Some(stdout.as_fd()),
            SourceState::Reading(file) => Some(file.as_fd()),
            _ => None,
        }
    }

    /// How long the event loop may sleep before [`Self::tick`] has work.
    pub fn timeout(&self, now: Instant) -> Option<Duration> {
        match self.state {
            SourceState::Waiting { until } => Some(until.saturating_duration_since(now)),
            _ => None,
        }
    }

    /// Re-run the command once its respawn interval has passed.
    pub fn tick(&mut self, now: Instant) {
        let SourceState::Waiting { until } = self.state else {
            return;
        };
        if now < until {
            return;
        }
        let SourceKind::Command { command, respawn } = &self.kind else {
            return;
        };
        match spawn_shell(command) {
            Ok((child, stdout)) => {
                self.spawn_count += 1;
                self.state = SourceState::Running { child, stdout };
            }
            Err(e) => {
                log::error!("{e}");
                self.state = match respawn {
                    Some(interval) => SourceState::Waiting {
                        until: now + *interval,
                    },
                    None => SourceState::Finished,
                };
            }
        }
    }

    /// Read what is available into `reader` and return the completed lines.
    ///
    /// End of stream reaps the command and schedules its next run; any
    /// unterminated tail it left behind is dropped.
    pub fn read_lines(&mut self, reader: &mut LineReader, now: Instant) -> Vec<Line> {
        let result = match &mut self.state {
            SourceState::Running { stdout, .. } => reader.fill_from(stdout),
            SourceState::Reading(file) => reader.fill_from(file),
            _ => return Vec::new(),
        };

        match result {
            Ok(Some(lines)) => lines,
            Ok(None) => {
                reader.clear();
                self.end_of_stream(now);
                Vec::new()
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                ) =>
            {
                Vec::new()
            }
            Err(e) => {
                log::warn!("Read from text source failed: {e}");
                reader.clear();
                self.end_of_stream(now);
                Vec::new()
            }
        }
    }

    fn end_of_stream(&mut self, now: Instant) {
        let previous = std::mem::replace(&mut self.state, SourceState::Finished);
        match previous {
            SourceState::Running { mut child, stdout } => {
                drop(stdout);
                match child.wait() {
                    Ok(status) => log::debug!("Source command exited: {status}"),
                    Err(e) => log::warn!("Failed to reap source command: {e}"),
                }
                if let SourceKind::Command {
                    respawn: Some(interval),
                    ..
                } = self.kind
                {
                    self.state = SourceState::Waiting {
                        until: now + interval,
                    };
                } else {
                    log::info!("Source command finished");
                }
            }
            SourceState::Reading(_) => log::info!("Stdin closed"),
            other => self.state = other,
        }
    }
}

impl Drop for TextSource {
    fn drop(&mut self) {
        if let SourceState::Running { child, .. } = &mut self.state {
            // The command may still be running when the bar closes
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

fn spawn_shell(command: &str) -> Result<(Child, ChildStdout), SourceError> {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|source| SourceError::Spawn {
            command: command.to_string(),
            source,
        })?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| SourceError::NoStdout(command.to_string()))?;
    log::info!("Spawned source command '{}' (pid {})", command, child.id());
    Ok((child, stdout))
}
