//! Change ledger queries

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use rusqlite::{Row, params};

use super::{Store, from_sql_int};
use crate::store::StoreError;
use crate::store::model::{
    ChangeEvent, ChangeType, DedupReport, NewChange, PendingChange, parse_iso, to_iso,
};

/// Predicate on `file_path` excluding backup, temp and editor lock artifacts
pub const IGNORED_PATHS_SQL: &str = "file_path NOT LIKE '%.bak' \
     AND file_path NOT LIKE '%.tmp' \
     AND file_path NOT LIKE '%.~%' \
     AND file_path NOT LIKE '%~%'";

impl Store<'_> {
    /// Append a change event, returning its row id
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_change(
        &self,
        job: &str,
        change: &NewChange,
        changed_at: DateTime<Utc>,
    ) -> Result<i64, StoreError> {
        self.conn()
            .prepare_cached(
                "INSERT INTO file_changes
                    (job_number, file_path, change_type, old_hash, new_hash, change_date, acknowledged)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
            )?
            .execute(params![
                job,
                change.relative_path,
                change.change_type.as_str(),
                change.old_hash,
                change.new_hash,
                to_iso(changed_at),
            ])?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Paths with an unacknowledged deletion event
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn pending_deletions(&self, job: &str) -> Result<HashSet<String>, StoreError> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT DISTINCT file_path FROM file_changes
             WHERE job_number = ?1 AND change_type = 'deleted' AND acknowledged = 0",
        )?;
        let paths = stmt
            .query_map([job], |row| row.get::<_, String>(0))?
            .collect::<Result<HashSet<_>, _>>()?;
        Ok(paths)
    }

    /// Acknowledge pending events for one path, optionally of one type only
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub fn acknowledge(
        &self,
        job: &str,
        relative_path: &str,
        change_type: Option<ChangeType>,
    ) -> Result<usize, StoreError> {
        let updated = match change_type {
            Some(kind) => self
                .conn()
                .prepare_cached(
                    "UPDATE file_changes SET acknowledged = 1
                     WHERE job_number = ?1 AND file_path = ?2 AND change_type = ?3
                       AND acknowledged = 0",
                )?
                .execute([job, relative_path, kind.as_str()])?,
            None => self
                .conn()
                .prepare_cached(
                    "UPDATE file_changes SET acknowledged = 1
                     WHERE job_number = ?1 AND file_path = ?2 AND acknowledged = 0",
                )?
                .execute([job, relative_path])?,
        };
        Ok(updated)
    }

    /// Acknowledge every pending event for a job
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub fn acknowledge_job(&self, job: &str) -> Result<usize, StoreError> {
        let updated = self
            .conn()
            .prepare_cached(
                "UPDATE file_changes SET acknowledged = 1
                 WHERE job_number = ?1 AND acknowledged = 0",
            )?
            .execute([job])?;
        Ok(updated)
    }

    /// Acknowledge every pending event in the ledger
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub fn acknowledge_all(&self) -> Result<usize, StoreError> {
        let updated = self
            .conn()
            .execute("UPDATE file_changes SET acknowledged = 1 WHERE acknowledged = 0", [])?;
        Ok(updated)
    }

    /// Remove superseded unacknowledged duplicates, keeping the newest row
    ///
    /// The first pass collapses per `(job, path, type)`. The second collapses
    /// deletion rows per `(job, path)`, which catches ledgers written before
    /// the classifier suppressed repeated deletions.
    ///
    /// # Errors
    /// Returns an error if either delete fails.
    pub fn collapse_duplicates(&self) -> Result<DedupReport, StoreError> {
        let duplicate_changes = self.conn().execute(
            "DELETE FROM file_changes
             WHERE acknowledged = 0
               AND id NOT IN (
                   SELECT MAX(id) FROM file_changes
                   WHERE acknowledged = 0
                   GROUP BY job_number, file_path, change_type
               )",
            [],
        )?;
        let duplicate_deletions = self.conn().execute(
            "DELETE FROM file_changes
             WHERE acknowledged = 0 AND change_type = 'deleted'
               AND id NOT IN (
                   SELECT MAX(id) FROM file_changes
                   WHERE acknowledged = 0 AND change_type = 'deleted'
                   GROUP BY job_number, file_path
               )",
            [],
        )?;
        Ok(DedupReport {
            duplicate_changes,
            duplicate_deletions,
        })
    }

    /// Distinct paths awaiting review, excluding deletions and ignored artifacts
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn pending_review_count(&self, job: &str) -> Result<u64, StoreError> {
        let count = self.conn().query_row(
            &format!(
                "SELECT COUNT(DISTINCT file_path) FROM file_changes
                 WHERE job_number = ?1 AND acknowledged = 0 AND change_type != 'deleted'
                   AND {IGNORED_PATHS_SQL}"
            ),
            [job],
            |row| row.get(0),
        )?;
        Ok(from_sql_int(count))
    }

    /// Distinct paths with any pending event, deletions included
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn raw_pending_count(&self, job: &str) -> Result<u64, StoreError> {
        let count = self.conn().query_row(
            &format!(
                "SELECT COUNT(DISTINCT file_path) FROM file_changes
                 WHERE job_number = ?1 AND acknowledged = 0 AND {IGNORED_PATHS_SQL}"
            ),
            [job],
            |row| row.get(0),
        )?;
        Ok(from_sql_int(count))
    }

    /// Raw pending counts for every job that has any
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn unread_counts(&self) -> Result<HashMap<String, u64>, StoreError> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT job_number, COUNT(DISTINCT file_path) FROM file_changes
             WHERE acknowledged = 0 AND {IGNORED_PATHS_SQL}
             GROUP BY job_number"
        ))?;
        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, from_sql_int(row.get(1)?)))
            })?
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(counts)
    }

    /// Pending non-deletion changes for a job, one per `(path, type)`, newest first
    ///
    /// # Errors
    /// Returns an error if the query fails or a row holds an unknown change type.
    pub fn pending_changes(&self, job: &str) -> Result<Vec<PendingChange>, StoreError> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT file_path, change_type, MAX(change_date) AS latest FROM file_changes
             WHERE job_number = ?1 AND acknowledged = 0 AND change_type != 'deleted'
               AND {IGNORED_PATHS_SQL}
             GROUP BY file_path, change_type
             ORDER BY latest DESC, file_path ASC"
        ))?;
        let rows = stmt
            .query_map([job], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(relative_path, kind, latest)| {
                Ok(PendingChange {
                    relative_path,
                    change_type: parse_change_type(&kind)?,
                    changed_at: latest.as_deref().and_then(parse_iso),
                })
            })
            .collect()
    }

    /// Ledger rows for a job, newest first; acknowledged rows only when asked
    ///
    /// # Errors
    /// Returns an error if the query fails or a row holds an unknown change type.
    pub fn changes(
        &self,
        job: &str,
        include_acknowledged: bool,
    ) -> Result<Vec<ChangeEvent>, StoreError> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT id, job_number, file_path, change_type, old_hash, new_hash,
                    change_date, acknowledged
             FROM file_changes
             WHERE job_number = ?1 AND (?2 OR acknowledged = 0)
             ORDER BY id DESC",
        )?;
        let rows = stmt
            .query_map(params![job, include_acknowledged], RawEvent::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RawEvent::into_event).collect()
    }

    /// Row counts of the ledger: (all rows, unacknowledged rows)
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn ledger_totals(&self) -> Result<(u64, u64), StoreError> {
        let (total, pending) = self.conn().query_row(
            "SELECT COUNT(*), COALESCE(SUM(CASE WHEN acknowledged = 0 THEN 1 ELSE 0 END), 0)
             FROM file_changes",
            [],
            |row| {
                Ok((
                    row.get::<_, Option<i64>>(0)?,
                    row.get::<_, Option<i64>>(1)?,
                ))
            },
        )?;
        Ok((from_sql_int(total), from_sql_int(pending)))
    }
}

struct RawEvent {
    id: i64,
    job: String,
    relative_path: String,
    change_type: String,
    old_hash: Option<String>,
    new_hash: Option<String>,
    changed_at: Option<String>,
    acknowledged: Option<bool>,
}

impl RawEvent {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            job: row.get(1)?,
            relative_path: row.get(2)?,
            change_type: row.get(3)?,
            old_hash: row.get(4)?,
            new_hash: row.get(5)?,
            changed_at: row.get(6)?,
            acknowledged: row.get(7)?,
        })
    }

    fn into_event(self) -> Result<ChangeEvent, StoreError> {
        Ok(ChangeEvent {
            id: self.id,
            job: self.job,
            relative_path: self.relative_path,
            change_type: parse_change_type(&self.change_type)?,
            old_hash: self.old_hash,
            new_hash: self.new_hash,
            changed_at: self.changed_at.as_deref().and_then(parse_iso),
            acknowledged: self.acknowledged.unwrap_or(false),
        })
    }
}

fn parse_change_type(value: &str) -> Result<ChangeType, StoreError> {
    value.parse().map_err(|_| StoreError::InvalidValue {
        column: "change_type",
        value: value.to_string(),
    })
}
