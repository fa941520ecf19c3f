//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/habitgrid/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/habitgrid/` (~/.config/habitgrid/)
//! - Data: `$XDG_DATA_HOME/habitgrid/` (~/.local/share/habitgrid/)
//! - State/Logs: `$XDG_STATE_HOME/habitgrid/` (~/.local/state/habitgrid/)

use crate::analytics::Period;
use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Owner identity for stored goals and records
    #[serde(default)]
    pub user: UserConfig,

    /// Analytics configuration
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Owner identity.
///
/// habitgrid is single-user; the id only partitions rows so several people
/// can share one database file without seeing each other's goals.
#[derive(Debug, Deserialize)]
pub struct UserConfig {
    #[serde(default = "default_user_id")]
    pub id: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            id: default_user_id(),
        }
    }
}

fn default_user_id() -> String {
    "local".to_string()
}

/// Analytics configuration
#[derive(Debug, Deserialize)]
pub struct AnalyticsConfig {
    /// Trailing window used for percentiles when none is requested
    #[serde(default)]
    pub default_period: Period,

    /// Let the overview's current streak start from yesterday when today
    /// has no completed record yet
    #[serde(default)]
    pub grace_day: bool,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            default_period: Period::default(),
            grace_day: false,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        if config.user.id.trim().is_empty() {
            return Err(Error::Config("user.id must not be empty".to_string()));
        }

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/habitgrid/config.toml` (~/.config/habitgrid/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("habitgrid").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/habitgrid/` (~/.local/share/habitgrid/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("habitgrid")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/habitgrid/` (~/.local/state/habitgrid/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("habitgrid")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/habitgrid/data.db` (~/.local/share/habitgrid/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Returns the log file prefix
    ///
    /// `$XDG_STATE_HOME/habitgrid/habitgrid.log` (~/.local/state/habitgrid/habitgrid.log).
    /// Daily rotation appends the UTC date, so the files on disk are named
    /// `habitgrid.log.YYYY-MM-DD`; see [`Config::log_file_for`].
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("habitgrid.log")
    }

    /// Returns the rotated log file written on `date` (UTC)
    pub fn log_file_for(date: NaiveDate) -> PathBuf {
        Self::state_dir().join(format!("habitgrid.log.{}", date.format("%Y-%m-%d")))
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path behavior
    /// before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
