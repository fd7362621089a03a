//! Store query modules organized by relation

mod history;
mod inventory;
mod ledger;

// Re-export Store for the impl blocks
pub(super) use super::Store;

pub use ledger::IGNORED_PATHS_SQL;

/// Convert an unsigned count to an SQLite integer
pub(super) fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Convert an SQLite integer to an unsigned count, treating negatives as zero
pub(super) fn from_sql_int(value: Option<i64>) -> u64 {
    value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0)
}
