//! Connection acquisition with retry under lock contention

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use rusqlite::{Connection, ErrorCode};
use tracing::{error, warn};

use super::StoreError;
use crate::config::MonitorConfig;
use crate::retry::RetryPolicy;

/// Returns true for "database is locked" class errors
#[must_use]
pub fn is_busy(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if matches!(failure.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
}

/// Opens configured connections to the monitor database
#[derive(Debug, Clone)]
pub struct ConnectionManager {
    path: PathBuf,
    busy_timeout: Duration,
    cache_size: i64,
    retry: RetryPolicy,
}

impl ConnectionManager {
    /// Create a manager with default pragmas and the connection retry schedule
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_config(&MonitorConfig::new(path))
    }

    #[must_use]
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            path: config.database_path.clone(),
            busy_timeout: config.busy_timeout(),
            cache_size: config.cache_size,
            retry: config.connection_retry,
        }
    }

    /// Set the retry schedule
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set the SQLite busy handler timeout
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a validated connection
    ///
    /// A locked database is retried on the configured schedule. Returns
    /// `None` when retries run out or on any other open failure, so the
    /// caller can skip this cycle.
    #[must_use]
    pub fn acquire(&self) -> Option<Connection> {
        let attempts = self.retry.attempts();

        for attempt in 0..attempts {
            match self.open_configured() {
                Ok(conn) => return Some(conn),
                Err(err) if is_busy(&err) => {
                    if attempt + 1 == attempts {
                        break;
                    }
                    let delay = self.retry.delay_for(attempt);
                    warn!(
                        path = %self.path.display(),
                        attempt = attempt + 1,
                        attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Database locked, retrying"
                    );
                    thread::sleep(delay);
                }
                Err(err) => {
                    error!(path = %self.path.display(), error = %err, "Database error");
                    return None;
                }
            }
        }

        error!(
            path = %self.path.display(),
            attempts,
            "Failed to connect to database after all retries"
        );
        None
    }

    /// Like `acquire`, for callers that report failure as an error
    ///
    /// # Errors
    /// Returns `StoreError::Unavailable` when no connection could be opened.
    pub fn try_acquire(&self) -> Result<Connection, StoreError> {
        self.acquire()
            .ok_or_else(|| StoreError::Unavailable(self.path.clone()))
    }

    fn open_configured(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(self.busy_timeout)?;
        conn.execute_batch(&format!(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA cache_size={};
             PRAGMA temp_store=MEMORY;",
            self.cache_size
        ))?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(conn)
    }
}
