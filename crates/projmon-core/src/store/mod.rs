//! Store module: SQLite persistence for the monitor
//!
//! Three relations live here: the per-file inventory, the change ledger and
//! the scan history. Every query is partitioned by job identifier.

pub mod connection;
pub mod model;
mod queries;
pub mod schema;

use std::path::PathBuf;

use rusqlite::Connection;
use thiserror::Error;

pub use connection::{ConnectionManager, is_busy};
pub use queries::IGNORED_PATHS_SQL;

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Monitor database unavailable: {0}")]
    Unavailable(PathBuf),

    #[error("Invalid value in {column}: {value}")]
    InvalidValue { column: &'static str, value: String },
}

/// Query surface over one connection or transaction
///
/// A `rusqlite::Transaction` derefs to `Connection`, so a scan can run
/// every write through the same `Store` and commit once.
#[derive(Debug, Clone, Copy)]
pub struct Store<'conn> {
    conn: &'conn Connection,
}

impl<'conn> Store<'conn> {
    #[must_use]
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Get access to the connection for query modules
    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

#[cfg(test)]
mod tests;
