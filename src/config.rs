//! Application Configuration
//!
//! JSON config file with defaults for every field, plus environment
//! overrides for the paths.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_DB_PATH: &str = "BREWLOG_DB_PATH";
pub const ENV_LOG_DIR: &str = "BREWLOG_LOG_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Failed to write config {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite database file
    pub db_path: PathBuf,
    /// Directory for rolling log files; logging to file is off when unset
    pub log_dir: Option<PathBuf>,
    /// Used for log file names
    pub app_name: String,
    pub log_max_bytes: u64,
    pub log_max_files: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("brew_log.db"),
            log_dir: None,
            app_name: "BrewLog".to_string(),
            log_max_bytes: rolling_logger::DEFAULT_MAX_BYTES,
            log_max_files: rolling_logger::DEFAULT_MAX_FILES,
        }
    }
}

impl AppConfig {
    /// Load config from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        let json = serde_json::to_string_pretty(self).map_err(|e| write_err(std::io::Error::from(e)))?;
        std::fs::write(path, json).map_err(write_err)
    }

    /// Apply `BREWLOG_DB_PATH` / `BREWLOG_LOG_DIR` from the environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db_path) = lookup(ENV_DB_PATH).filter(|v| !v.is_empty()) {
            self.db_path = PathBuf::from(db_path);
        }
        if let Some(log_dir) = lookup(ENV_LOG_DIR).filter(|v| !v.is_empty()) {
            self.log_dir = Some(PathBuf::from(log_dir));
        }
    }

    pub fn logger_options(&self) -> Option<rolling_logger::LoggerOptions> {
        let dir = self.log_dir.as_ref()?;
        let mut options = rolling_logger::LoggerOptions::new(dir.clone(), &self.app_name);
        options.max_bytes = self.log_max_bytes;
        options.max_files = self.log_max_files;
        Some(options)
    }
}
