//! Schema creation and additive migration
//!
//! Older databases may predate a column or table. Missing pieces are added
//! at startup; nothing is ever dropped or rewritten.

use std::collections::HashSet;

use rusqlite::Connection;
use tracing::info;

use super::StoreError;

const TABLES_SQL: &str = r"
CREATE TABLE IF NOT EXISTS project_structure (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_number TEXT NOT NULL,
    file_path TEXT NOT NULL,
    file_name TEXT NOT NULL,
    file_type TEXT,
    file_size INTEGER,
    created_date TEXT,
    modified_date TEXT,
    file_hash TEXT,
    parent_path TEXT,
    scan_date TEXT,
    hash_locked INTEGER NOT NULL DEFAULT 0,
    UNIQUE(job_number, file_path)
);

CREATE TABLE IF NOT EXISTS file_changes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_number TEXT NOT NULL,
    file_path TEXT NOT NULL,
    change_type TEXT NOT NULL,
    old_hash TEXT,
    new_hash TEXT,
    change_date TEXT,
    acknowledged BOOLEAN DEFAULT 0
);

CREATE TABLE IF NOT EXISTS project_scan_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    job_number TEXT NOT NULL,
    scan_date TEXT NOT NULL,
    files_scanned INTEGER,
    changes_detected INTEGER,
    scan_duration REAL
);
";

const INDEXES_SQL: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS idx_project_structure_job_path
    ON project_structure (job_number, file_path);
CREATE INDEX IF NOT EXISTS idx_file_changes_job_ack
    ON file_changes (job_number, acknowledged);
CREATE INDEX IF NOT EXISTS idx_file_changes_job_path
    ON file_changes (job_number, file_path);
CREATE INDEX IF NOT EXISTS idx_scan_history_job
    ON project_scan_history (job_number);
";

/// Columns every table must have: (table, column, declaration for ALTER TABLE)
const EXPECTED_COLUMNS: &[(&str, &str, &str)] = &[
    ("project_structure", "file_name", "TEXT NOT NULL DEFAULT ''"),
    ("project_structure", "file_type", "TEXT"),
    ("project_structure", "file_size", "INTEGER"),
    ("project_structure", "created_date", "TEXT"),
    ("project_structure", "modified_date", "TEXT"),
    ("project_structure", "file_hash", "TEXT"),
    ("project_structure", "parent_path", "TEXT"),
    ("project_structure", "scan_date", "TEXT"),
    ("project_structure", "hash_locked", "INTEGER NOT NULL DEFAULT 0"),
    ("file_changes", "old_hash", "TEXT"),
    ("file_changes", "new_hash", "TEXT"),
    ("file_changes", "change_date", "TEXT"),
    ("file_changes", "acknowledged", "BOOLEAN DEFAULT 0"),
    ("project_scan_history", "files_scanned", "INTEGER"),
    ("project_scan_history", "changes_detected", "INTEGER"),
    ("project_scan_history", "scan_duration", "REAL"),
];

/// Columns added by a migration run, as `table.column`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub added_columns: Vec<String>,
}

/// Create missing tables, add missing columns, then ensure indexes
///
/// # Errors
/// Returns an error if any DDL statement fails.
pub fn ensure_schema(conn: &Connection) -> Result<MigrationReport, StoreError> {
    conn.execute_batch(TABLES_SQL)?;

    let mut report = MigrationReport::default();
    let mut current_table = "";
    let mut columns = HashSet::new();

    for &(table, column, declaration) in EXPECTED_COLUMNS {
        if table != current_table {
            columns = table_columns(conn, table)?;
            current_table = table;
        }
        if columns.contains(column) {
            continue;
        }
        conn.execute(
            &format!("ALTER TABLE {table} ADD COLUMN {column} {declaration}"),
            [],
        )?;
        info!(table, column, "Added missing column");
        report.added_columns.push(format!("{table}.{column}"));
    }

    conn.execute_batch(INDEXES_SQL)?;
    Ok(report)
}

/// Names of the columns currently defined on `table`
///
/// # Errors
/// Returns an error if the pragma query fails.
pub fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>, StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(columns)
}
