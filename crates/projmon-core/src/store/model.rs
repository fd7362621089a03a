//! Store model types
//!
//! Rows are mapped into these records at the storage boundary; nothing above
//! the store sees positional tuples.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::scanner::{FileDigest, FileMetadata};

/// Kind of change recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    New,
    Updated,
    Deleted,
}

impl ChangeType {
    /// Value stored in the `change_type` column
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(Self::New),
            "updated" => Ok(Self::Updated),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!("unknown change type: {other}")),
        }
    }
}

/// One inventory row: the last observed state of a project file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    pub job: String,
    pub relative_path: String,
    pub file_name: String,
    pub extension: String,
    pub parent_path: String,
    pub size: u64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub content_hash: FileDigest,
    /// Whether the most recent scan found the file locked
    pub hash_locked: bool,
    pub scanned_at: DateTime<Utc>,
}

impl FileRecord {
    /// Build the inventory row for a freshly observed file
    #[must_use]
    pub fn from_metadata(
        job: &str,
        relative_path: &str,
        metadata: &FileMetadata,
        scanned_at: DateTime<Utc>,
    ) -> Self {
        Self {
            job: job.to_string(),
            relative_path: relative_path.to_string(),
            file_name: metadata.file_name.clone(),
            extension: metadata.extension.clone(),
            parent_path: metadata.parent_path.clone(),
            size: metadata.size,
            created: metadata.created.min(metadata.modified),
            modified: metadata.modified,
            content_hash: metadata.digest.clone(),
            hash_locked: metadata.digest.is_locked(),
            scanned_at,
        }
    }
}

/// A change to be appended to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewChange {
    pub relative_path: String,
    pub change_type: ChangeType,
    pub old_hash: Option<String>,
    pub new_hash: Option<String>,
}

/// One ledger row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeEvent {
    pub id: i64,
    pub job: String,
    pub relative_path: String,
    pub change_type: ChangeType,
    pub old_hash: Option<String>,
    pub new_hash: Option<String>,
    pub changed_at: Option<DateTime<Utc>>,
    pub acknowledged: bool,
}

/// A pending change collapsed per `(path, type)`, newest occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingChange {
    pub relative_path: String,
    pub change_type: ChangeType,
    pub changed_at: Option<DateTime<Utc>>,
}

/// One completed scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanHistoryRecord {
    pub id: i64,
    pub job: String,
    pub scanned_at: Option<DateTime<Utc>>,
    pub files_scanned: u64,
    pub changes_detected: u64,
    pub duration_secs: f64,
}

/// Rows removed by a dedup maintenance pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub duplicate_changes: usize,
    pub duplicate_deletions: usize,
}

impl DedupReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.duplicate_changes + self.duplicate_deletions
    }
}

/// Row counts for diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub total_files: u64,
    pub files_per_job: BTreeMap<String, u64>,
    pub total_changes: u64,
    pub pending_changes: u64,
    pub scans_recorded: u64,
}

/// Format a timestamp for an ISO-8601 text column
#[must_use]
pub fn to_iso(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Parse an ISO-8601 text column
///
/// Accepts RFC 3339 with an offset, and naive timestamps written by older
/// versions of the tools, which are local time.
#[must_use]
pub fn parse_iso(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
