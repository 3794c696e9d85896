//! Logging initialization.
//!
//! The terminal is taken by the timer display, so log output goes to a file
//! (`<data_local_dir>/brew_timer/brew_timer.log` unless overridden). When no
//! data directory can be determined, logs fall back to stderr.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

pub const LOG_ENV_VAR: &str = "BREW_TIMER_LOG";

/// Maps `-v` count to a tracing directive: 0 warn, 1 info, 2 debug, 3+ trace.
pub const fn verbosity_to_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn default_log_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| dir.join("brew_timer").join("brew_timer.log"))
}

/// Install the global subscriber and return where logs are written.
///
/// `BREW_TIMER_LOG` takes precedence over `verbosity`. Uses `try_init()`, so
/// a second call is ignored.
pub fn init_logging(verbosity: u8, log_file: Option<PathBuf>) -> Result<Option<PathBuf>> {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(verbosity_to_directive(verbosity)));

    let path = log_file.or_else(default_log_path);
    let writer = match &path {
        Some(path) => BoxMakeWriter::new(Mutex::new(open_log_file(path)?)),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(verbosity >= 2)
        .with_writer(writer)
        .try_init();

    Ok(path)
}

fn open_log_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}
