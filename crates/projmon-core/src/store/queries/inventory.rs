//! Inventory queries

use std::collections::{BTreeMap, HashMap};
use std::time::UNIX_EPOCH;

use chrono::{DateTime, Utc};
use rusqlite::{Row, params};

use super::{Store, from_sql_int, to_sql_int};
use crate::scanner::FileDigest;
use crate::store::StoreError;
use crate::store::model::{FileRecord, parse_iso, to_iso};

const RECORD_COLUMNS: &str = "job_number, file_path, file_name, file_type, file_size, \
     created_date, modified_date, file_hash, parent_path, scan_date, hash_locked";

impl Store<'_> {
    /// Every inventory row for `job`, keyed by relative path
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn inventory(&self, job: &str) -> Result<HashMap<String, FileRecord>, StoreError> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {RECORD_COLUMNS} FROM project_structure WHERE job_number = ?1"
        ))?;
        let records = stmt
            .query_map([job], record_from_row)?
            .map(|row| row.map(|record| (record.relative_path.clone(), record)))
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(records)
    }

    /// Inventory rows for `job`, most recently modified first
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn inventory_by_modified(&self, job: &str) -> Result<Vec<FileRecord>, StoreError> {
        let mut stmt = self.conn().prepare_cached(&format!(
            "SELECT {RECORD_COLUMNS} FROM project_structure
             WHERE job_number = ?1
             ORDER BY modified_date DESC, file_path ASC"
        ))?;
        let records = stmt
            .query_map([job], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Insert or refresh the row for `(record.job, record.relative_path)`
    ///
    /// # Errors
    /// Returns an error if the statement fails.
    pub fn upsert_file(&self, record: &FileRecord) -> Result<(), StoreError> {
        let created = record.created.min(record.modified);
        self.conn()
            .prepare_cached(
                "INSERT INTO project_structure
                    (job_number, file_path, file_name, file_type, file_size,
                     created_date, modified_date, file_hash, parent_path, scan_date, hash_locked)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT(job_number, file_path) DO UPDATE SET
                    file_name = excluded.file_name,
                    file_type = excluded.file_type,
                    file_size = excluded.file_size,
                    created_date = excluded.created_date,
                    modified_date = excluded.modified_date,
                    file_hash = excluded.file_hash,
                    parent_path = excluded.parent_path,
                    scan_date = excluded.scan_date,
                    hash_locked = excluded.hash_locked",
            )?
            .execute(params![
                record.job,
                record.relative_path,
                record.file_name,
                record.extension,
                to_sql_int(record.size),
                to_iso(created),
                to_iso(record.modified),
                record.content_hash.as_stored(),
                record.parent_path,
                to_iso(record.scanned_at),
                record.hash_locked,
            ])?;
        Ok(())
    }

    /// Remove the row for a file confirmed absent from disk
    ///
    /// # Errors
    /// Returns an error if the statement fails.
    pub fn remove_file(&self, job: &str, relative_path: &str) -> Result<bool, StoreError> {
        let removed = self
            .conn()
            .prepare_cached(
                "DELETE FROM project_structure WHERE job_number = ?1 AND file_path = ?2",
            )?
            .execute([job, relative_path])?;
        Ok(removed > 0)
    }

    /// Number of tracked files per job
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn tracked_file_counts(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        let mut stmt = self.conn().prepare_cached(
            "SELECT job_number, COUNT(*) FROM project_structure GROUP BY job_number",
        )?;
        let counts = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, from_sql_int(row.get(1)?)))
            })?
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(counts)
    }
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    let epoch = DateTime::<Utc>::from(UNIX_EPOCH);
    // An unparsable modified date compares as the epoch, which reports the
    // file as updated on the next scan and rewrites a clean value.
    let modified = row
        .get::<_, Option<String>>(6)?
        .as_deref()
        .and_then(parse_iso)
        .unwrap_or(epoch);
    let created = row
        .get::<_, Option<String>>(5)?
        .as_deref()
        .and_then(parse_iso)
        .unwrap_or(modified)
        .min(modified);

    Ok(FileRecord {
        job: row.get(0)?,
        relative_path: row.get(1)?,
        file_name: row.get(2)?,
        extension: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        size: from_sql_int(row.get(4)?),
        created,
        modified,
        content_hash: FileDigest::from_stored(&row.get::<_, Option<String>>(7)?.unwrap_or_default()),
        parent_path: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        scanned_at: row
            .get::<_, Option<String>>(9)?
            .as_deref()
            .and_then(parse_iso)
            .unwrap_or(epoch),
        hash_locked: row.get::<_, Option<bool>>(10)?.unwrap_or(false),
    })
}
