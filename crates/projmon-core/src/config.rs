//! Monitor configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registry::ProjectRoot;
use crate::retry::RetryPolicy;

/// Default SQLite file, shared with the rest of the drafting tools
pub const DEFAULT_DATABASE: &str = "drafting_tools.db";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tunables for scanning, polling and store access
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Path of the SQLite database holding inventory, ledger and history
    pub database_path: PathBuf,
    /// Delay between background scans of the focused project
    pub poll_interval_ms: u64,
    /// Delay after a failed background iteration before resuming
    pub error_backoff_ms: u64,
    /// Pause between projects during a scan of every project
    pub project_pause_ms: u64,
    /// SQLite busy handler timeout
    pub busy_timeout_ms: u64,
    /// SQLite page cache size
    pub cache_size: i64,
    /// Read buffer size used while hashing
    pub hash_chunk_size: usize,
    /// Retry schedule for files locked by another process
    pub hash_retry: RetryPolicy,
    /// Retry schedule for a locked database
    pub connection_retry: RetryPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE),
            poll_interval_ms: 5_000,
            error_backoff_ms: 60_000,
            project_pause_ms: 500,
            busy_timeout_ms: 30_000,
            cache_size: 10_000,
            hash_chunk_size: 64 * 1024,
            hash_retry: RetryPolicy::hashing(),
            connection_retry: RetryPolicy::connection(),
        }
    }
}

impl MonitorConfig {
    /// Create a configuration for the given database with default tunables
    #[must_use]
    pub fn new(database_path: impl Into<PathBuf>) -> Self {
        Self {
            database_path: database_path.into(),
            ..Self::default()
        }
    }

    /// Set the background poll interval
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = duration_millis(interval);
        self
    }

    /// Set the back-off used after a failed background iteration
    #[must_use]
    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff_ms = duration_millis(backoff);
        self
    }

    /// Set the pause inserted between projects
    #[must_use]
    pub fn with_project_pause(mut self, pause: Duration) -> Self {
        self.project_pause_ms = duration_millis(pause);
        self
    }

    /// Set the SQLite busy timeout
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = duration_millis(timeout);
        self
    }

    /// Set the hashing retry schedule
    #[must_use]
    pub fn with_hash_retry(mut self, policy: RetryPolicy) -> Self {
        self.hash_retry = policy;
        self
    }

    /// Set the connection retry schedule
    #[must_use]
    pub fn with_connection_retry(mut self, policy: RetryPolicy) -> Self {
        self.connection_retry = policy;
        self
    }

    #[must_use]
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[must_use]
    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    #[must_use]
    pub fn project_pause(&self) -> Duration {
        Duration::from_millis(self.project_pause_ms)
    }

    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Reject values that would stall or spin the monitor
    ///
    /// # Errors
    /// Returns `ConfigError::Invalid` naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path is empty".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.hash_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "hash_chunk_size must be greater than zero".to_string(),
            ));
        }
        for (name, policy) in [
            ("hash_retry", &self.hash_retry),
            ("connection_retry", &self.connection_retry),
        ] {
            if policy.attempts == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{name}.attempts must be at least 1"
                )));
            }
            if !policy.multiplier.is_finite() || policy.multiplier < 1.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name}.multiplier must be a finite value >= 1.0"
                )));
            }
        }
        Ok(())
    }
}

/// On-disk configuration: a `[monitor]` table plus the `[[projects]]` registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub monitor: MonitorConfig,
    pub projects: Vec<ProjectRoot>,
}

impl ConfigFile {
    /// Parse a configuration document
    ///
    /// # Errors
    /// Returns an error if the TOML is malformed or the monitor section is invalid.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let file: Self = toml::from_str(text)?;
        file.monitor.validate()?;
        Ok(file)
    }

    /// Load and validate a configuration file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
