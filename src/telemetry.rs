//! Telemetry utilities for command timing, log correlation and the daily
//! log file.

use chrono::{Local, NaiveDate};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::fmt::MakeWriter;

/// Guard for timing command execution.
///
/// Logs the command latency at debug level when dropped.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        tracing::debug!(command = %self.command, elapsed_ms, "Command finished");
    }
}

/// Appends log lines to `<dir>/YYYY-MM-DD.log`, one file per local day.
///
/// The file is opened per event, so the day rolls over without a restart.
#[derive(Debug, Clone)]
pub struct DailyLogFile {
    dir: PathBuf,
}

impl DailyLogFile {
    /// Create `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.log", date.format("%Y-%m-%d")))
    }

    /// File today's lines go to.
    pub fn current_path(&self) -> PathBuf {
        self.path_for(Local::now().date_naive())
    }
}

impl<'a> MakeWriter<'a> for DailyLogFile {
    type Writer = DailyLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DailyLogWriter {
            path: self.current_path(),
        }
    }
}

/// Writer for a single event.
#[derive(Debug)]
pub struct DailyLogWriter {
    path: PathBuf,
}

impl Write for DailyLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span for one game session (one connection attempt).
    pub fn session(generation: u64) -> Span {
        info_span!("session", generation)
    }

    /// Span for plugin activation.
    pub fn plugin(name: &str) -> Span {
        info_span!("plugin", name = %name)
    }

    /// Span for a command execution.
    pub fn command(name: &str, user: &str) -> Span {
        info_span!("command", name = %name, user = %user)
    }

    /// Span for a status-feed client.
    pub fn status_client(id: &uuid::Uuid) -> Span {
        info_span!("status_client", id = %id)
    }
}
