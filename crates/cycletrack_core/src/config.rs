//! Runtime configuration for the cycle tracker.
//!
//! # Responsibility
//! - Resolve database and log locations plus display defaults.
//! - Load an optional TOML file, then apply environment overrides.
//!
//! # Invariants
//! - A missing config file is not an error; defaults apply.
//! - Environment variables win over file values.
//! - Blank environment values are ignored.

use crate::logging::default_log_level;
use crate::repo::cycle_repo::CYCLES_DEFAULT_LIMIT;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const CONFIG_PATH_ENV: &str = "CYCLETRACK_CONFIG";
pub const DB_PATH_ENV: &str = "CYCLETRACK_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "CYCLETRACK_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "CYCLETRACK_LOG_DIR";

const APP_DIR_NAME: &str = "cycletrack";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "cycletrack.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: Option<PathBuf>,
        source: toml::de::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot access `{}`: {source}", path.display())
            }
            Self::Parse {
                path: Some(path),
                source,
            } => write!(f, "invalid config file `{}`: {source}", path.display()),
            Self::Parse { path: None, source } => write!(f, "invalid config: {source}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
    /// Records shown by history, aggregate and export views.
    pub history_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = app_data_dir();
        Self {
            db_path: data_dir.join(DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: data_dir.join(LOG_DIR_NAME),
            history_limit: CYCLES_DEFAULT_LIMIT,
        }
    }
}

impl AppConfig {
    /// Loads the config file (from `CYCLETRACK_CONFIG` or the platform config
    /// directory) and applies process environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = env_value(CONFIG_PATH_ENV, |key| std::env::var(key).ok())
            .map(PathBuf::from)
            .or_else(default_config_path);
        let config = match path {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Reads a TOML file; a missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: Some(path.to_path_buf()),
            source,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse { path: None, source })
    }

    /// Applies `CYCLETRACK_*` overrides read through `lookup`.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(value) = env_value(DB_PATH_ENV, &lookup) {
            self.db_path = PathBuf::from(value);
        }
        if let Some(value) = env_value(LOG_LEVEL_ENV, &lookup) {
            self.log_level = value;
        }
        if let Some(value) = env_value(LOG_DIR_ENV, &lookup) {
            self.log_dir = PathBuf::from(value);
        }
        self
    }

    /// Creates the database parent directory if needed.
    pub fn ensure_dirs(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        Ok(())
    }
}

/// Platform config file location, e.g. `~/.config/cycletrack/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

fn env_value(key: &str, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
