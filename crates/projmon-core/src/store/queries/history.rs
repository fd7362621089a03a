//! Scan history queries

use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::params;

use super::{Store, from_sql_int, to_sql_int};
use crate::store::StoreError;
use crate::store::model::{ScanHistoryRecord, parse_iso, to_iso};

impl Store<'_> {
    /// Record one completed scan, returning its row id
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_scan(
        &self,
        job: &str,
        scanned_at: DateTime<Utc>,
        files_scanned: u64,
        changes_detected: u64,
        duration: Duration,
    ) -> Result<i64, StoreError> {
        self.conn()
            .prepare_cached(
                "INSERT INTO project_scan_history
                    (job_number, scan_date, files_scanned, changes_detected, scan_duration)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?
            .execute(params![
                job,
                to_iso(scanned_at),
                to_sql_int(files_scanned),
                to_sql_int(changes_detected),
                duration.as_secs_f64(),
            ])?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Most recent scans for a job, newest first
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn scan_history(
        &self,
        job: &str,
        limit: usize,
    ) -> Result<Vec<ScanHistoryRecord>, StoreError> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT id, job_number, scan_date, files_scanned, changes_detected, scan_duration
             FROM project_scan_history
             WHERE job_number = ?1
             ORDER BY id DESC
             LIMIT ?2",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = stmt
            .query_map(params![job, limit], |row| {
                Ok(ScanHistoryRecord {
                    id: row.get(0)?,
                    job: row.get(1)?,
                    scanned_at: row.get::<_, Option<String>>(2)?.as_deref().and_then(parse_iso),
                    files_scanned: from_sql_int(row.get(3)?),
                    changes_detected: from_sql_int(row.get(4)?),
                    duration_secs: row.get::<_, Option<f64>>(5)?.unwrap_or_default(),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Number of scans recorded across all jobs
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn scans_recorded(&self) -> Result<u64, StoreError> {
        let count = self
            .conn()
            .query_row("SELECT COUNT(*) FROM project_scan_history", [], |row| row.get(0))?;
        Ok(from_sql_int(count))
    }
}
