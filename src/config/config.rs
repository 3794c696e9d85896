//! Settings file loading and CLI override merging.
//!
//! The file lives at `<config_dir>/brew_timer/config.toml` unless a path is
//! given explicitly. Every key is optional:
//!
//! ```toml
//! work = "25m"
//! short_break = "5m"
//! long_break = "15m"
//! cycles_before_long_break = 4
//! auto_advance = true
//! alert = "desktop"   # desktop | bell | none
//! history_size = 5
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::duration::parse_duration;
use crate::alert::alert::AlertKind;
use crate::pomodoro::pomodoro::{CYCLES_BEFORE_LONG_BREAK, SESSION_HISTORY_LIMIT};
use crate::pomodoro::timer::{Durations, PhaseTimer, TimerError};

pub const MAX_WORK_SECS: u64 = 180 * 60;
pub const MAX_BREAK_SECS: u64 = 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid duration '{input}': expected e.g. 25m, 90s, 1h30m or whole minutes")]
    InvalidDurationString { input: String },

    #[error("{field} must be at most {max} seconds, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("history_size must be at least 1")]
    EmptyHistory,

    #[error(transparent)]
    Timer(#[from] TimerError),
}

/// Raw contents of the TOML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub work: Option<String>,
    pub short_break: Option<String>,
    pub long_break: Option<String>,
    pub cycles_before_long_break: Option<u32>,
    pub auto_advance: Option<bool>,
    pub alert: Option<AlertKind>,
    pub history_size: Option<usize>,
}

/// Values given on the command line; they win over the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub work: Option<u64>,
    pub short_break: Option<u64>,
    pub long_break: Option<u64>,
    pub cycles_before_long_break: Option<u32>,
    pub alert: Option<AlertKind>,
    pub no_auto_advance: bool,
}

/// Fully resolved settings handed to the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub durations: Durations,
    pub cycles_before_long_break: u32,
    pub auto_advance: bool,
    pub alert: AlertKind,
    pub history_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            durations: Durations::default(),
            cycles_before_long_break: CYCLES_BEFORE_LONG_BREAK,
            auto_advance: true,
            alert: AlertKind::default(),
            history_size: SESSION_HISTORY_LIMIT,
        }
    }
}

impl Settings {
    /// Build a timer in its initial state from these settings.
    pub fn build_timer(&self) -> Result<PhaseTimer, TimerError> {
        PhaseTimer::with_durations(
            self.durations.work,
            self.durations.short_break,
            self.durations.long_break,
            Some(self.cycles_before_long_break),
        )
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("brew_timer").join("config.toml"))
}

/// Load the file config. An explicit path must exist; the default path is
/// optional and falls back to an empty config.
pub fn load_file(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::MissingFile {
                    path: path.to_path_buf(),
                });
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using defaults");
                return Ok(FileConfig::default());
            }
        },
    };

    let contents = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    info!(path = %path.display(), "Loaded config file");
    Ok(config)
}

/// Merge file values and overrides over the defaults and validate the result.
pub fn resolve(file: FileConfig, overrides: &Overrides) -> Result<Settings, ConfigError> {
    let defaults = Settings::default();

    let from_file = |value: Option<String>, fallback: u64| -> Result<u64, ConfigError> {
        value.as_deref().map_or(Ok(fallback), parse_duration)
    };

    let durations = Durations {
        work: match overrides.work {
            Some(v) => v,
            None => from_file(file.work, defaults.durations.work)?,
        },
        short_break: match overrides.short_break {
            Some(v) => v,
            None => from_file(file.short_break, defaults.durations.short_break)?,
        },
        long_break: match overrides.long_break {
            Some(v) => v,
            None => from_file(file.long_break, defaults.durations.long_break)?,
        },
    };

    let settings = Settings {
        durations,
        cycles_before_long_break: overrides
            .cycles_before_long_break
            .or(file.cycles_before_long_break)
            .unwrap_or(defaults.cycles_before_long_break),
        auto_advance: !overrides.no_auto_advance
            && file.auto_advance.unwrap_or(defaults.auto_advance),
        alert: overrides.alert.or(file.alert).unwrap_or(defaults.alert),
        history_size: file.history_size.unwrap_or(defaults.history_size),
    };

    validate(&settings)?;
    Ok(settings)
}

/// Range checks for user-entered durations, on top of the timer's own
/// positivity check.
pub fn validate_durations(durations: &Durations, cycles: u32) -> Result<(), ConfigError> {
    for (field, value, max) in [
        ("work", durations.work, MAX_WORK_SECS),
        ("short_break", durations.short_break, MAX_BREAK_SECS),
        ("long_break", durations.long_break, MAX_BREAK_SECS),
    ] {
        if value == 0 {
            return Err(TimerError::InvalidDuration { field, value }.into());
        }
        if value > max {
            return Err(ConfigError::OutOfRange { field, value, max });
        }
    }
    if cycles == 0 {
        return Err(TimerError::InvalidDuration {
            field: "cycles_before_long_break",
            value: 0,
        }
        .into());
    }
    Ok(())
}

fn validate(settings: &Settings) -> Result<(), ConfigError> {
    validate_durations(&settings.durations, settings.cycles_before_long_break)?;
    if settings.history_size == 0 {
        return Err(ConfigError::EmptyHistory);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_config_resolves_to_defaults() {
        let settings = resolve(FileConfig::default(), &Overrides::default()).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.durations.work, 1500);
        assert!(settings.auto_advance);
    }

    #[test]
    fn test_file_values_are_used() {
        let file = write_config(
            r#"
work = "50m"
short_break = "10m"
long_break = "30"
cycles_before_long_break = 3
auto_advance = false
alert = "bell"
history_size = 8
"#,
        );
        let config = load_file(Some(file.path())).unwrap();
        let settings = resolve(config, &Overrides::default()).unwrap();
        assert_eq!(settings.durations.work, 3000);
        assert_eq!(settings.durations.short_break, 600);
        assert_eq!(settings.durations.long_break, 1800);
        assert_eq!(settings.cycles_before_long_break, 3);
        assert!(!settings.auto_advance);
        assert_eq!(settings.alert, AlertKind::Bell);
        assert_eq!(settings.history_size, 8);
    }

    #[test]
    fn test_overrides_win_over_file() {
        let file = write_config("work = \"50m\"\ncycles_before_long_break = 3\n");
        let config = load_file(Some(file.path())).unwrap();
        let overrides = Overrides {
            work: Some(20 * 60),
            cycles_before_long_break: Some(2),
            alert: Some(AlertKind::None),
            no_auto_advance: true,
            ..Overrides::default()
        };
        let settings = resolve(config, &overrides).unwrap();
        assert_eq!(settings.durations.work, 1200);
        assert_eq!(settings.cycles_before_long_break, 2);
        assert_eq!(settings.alert, AlertKind::None);
        assert!(!settings.auto_advance);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(
            load_file(Some(&path)),
            Err(ConfigError::MissingFile { .. })
        ));
    }

    #[test]
    fn test_unknown_key_is_a_parse_error() {
        let file = write_config("wrok = \"25m\"\n");
        assert!(matches!(
            load_file(Some(file.path())),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_bad_duration_string_in_file() {
        let file = write_config("short_break = \"soon\"\n");
        let config = load_file(Some(file.path())).unwrap();
        assert!(matches!(
            resolve(config, &Overrides::default()),
            Err(ConfigError::InvalidDurationString { .. })
        ));
    }

    #[test]
    fn test_range_limits() {
        let too_long = Overrides {
            work: Some(MAX_WORK_SECS + 1),
            ..Overrides::default()
        };
        assert!(matches!(
            resolve(FileConfig::default(), &too_long),
            Err(ConfigError::OutOfRange { field: "work", .. })
        ));

        let long_break = Overrides {
            long_break: Some(MAX_BREAK_SECS + 60),
            ..Overrides::default()
        };
        assert!(matches!(
            resolve(FileConfig::default(), &long_break),
            Err(ConfigError::OutOfRange {
                field: "long_break",
                ..
            })
        ));

        let quick = Overrides {
            work: Some(10),
            short_break: Some(3),
            long_break: Some(5),
            ..Overrides::default()
        };
        assert!(resolve(FileConfig::default(), &quick).is_ok());
    }

    #[test]
    fn test_zero_cycles_and_history_rejected() {
        let zero_cycles = Overrides {
            cycles_before_long_break: Some(0),
            ..Overrides::default()
        };
        assert!(matches!(
            resolve(FileConfig::default(), &zero_cycles),
            Err(ConfigError::Timer(TimerError::InvalidDuration { .. }))
        ));

        let file = FileConfig {
            history_size: Some(0),
            ..FileConfig::default()
        };
        assert!(matches!(
            resolve(file, &Overrides::default()),
            Err(ConfigError::EmptyHistory)
        ));
    }

    #[test]
    fn test_build_timer_uses_settings() {
        let mut settings = Settings::default();
        settings.durations.work = 42;
        settings.cycles_before_long_break = 2;
        let timer = settings.build_timer().unwrap();
        assert_eq!(timer.time_left(), 42);
        assert_eq!(timer.cycles_before_long_break(), 2);
    }
}
