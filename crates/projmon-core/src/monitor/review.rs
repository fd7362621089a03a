//! Review listing and project ordering

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::store::model::{ChangeType, FileRecord, PendingChange};

/// Review state of one file as shown to a reviewer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// An editor lock file (`~` prefix) is sitting in the project
    InUse,
    New,
    Updated,
    /// The last scan could not read the file
    Locked,
    NoChanges,
}

impl ReviewStatus {
    /// True for statuses that still need a reviewer's attention
    #[must_use]
    pub fn is_changed(self) -> bool {
        matches!(self, Self::New | Self::Updated)
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::InUse => "In Use",
            Self::New => "New File",
            Self::Updated => "Updated",
            Self::Locked => "Locked",
            Self::NoChanges => "No Changes",
        };
        f.write_str(label)
    }
}

/// One row of the review listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewEntry {
    pub relative_path: String,
    pub file_name: String,
    pub extension: String,
    /// Last modification time, or the change time for paths not in the inventory
    pub modified: Option<DateTime<Utc>>,
    pub status: ReviewStatus,
    /// False for pending paths no longer present in the inventory
    pub tracked: bool,
}

/// Build the review listing for one job
///
/// `inventory` must already be ordered newest first. Pending changes for
/// paths outside the inventory are appended in their own order.
#[must_use]
pub fn review_listing(inventory: &[FileRecord], pending: &[PendingChange]) -> Vec<ReviewEntry> {
    // Pending changes arrive newest first; the newest type wins per path
    let mut pending_types: HashMap<&str, ChangeType> = HashMap::new();
    for change in pending {
        pending_types
            .entry(change.relative_path.as_str())
            .or_insert(change.change_type);
    }

    let mut entries: Vec<ReviewEntry> = inventory
        .iter()
        .map(|record| ReviewEntry {
            relative_path: record.relative_path.clone(),
            file_name: record.file_name.clone(),
            extension: record.extension.clone(),
            modified: Some(record.modified),
            status: status_for(
                &record.file_name,
                pending_types.get(record.relative_path.as_str()).copied(),
                record.hash_locked || record.content_hash.is_locked(),
            ),
            tracked: true,
        })
        .collect();

    let tracked: HashSet<&str> = inventory.iter().map(|r| r.relative_path.as_str()).collect();
    let mut appended = HashSet::new();
    for change in pending {
        let path = change.relative_path.as_str();
        if tracked.contains(path) || !appended.insert(path) {
            continue;
        }
        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        let extension = file_name
            .rfind('.')
            .filter(|&idx| idx > 0)
            .map(|idx| file_name[idx..].to_string())
            .unwrap_or_default();
        let status = status_for(&file_name, pending_types.get(path).copied(), false);
        entries.push(ReviewEntry {
            relative_path: change.relative_path.clone(),
            file_name,
            extension,
            modified: change.changed_at,
            status,
            tracked: false,
        });
    }

    entries
}

fn status_for(file_name: &str, pending: Option<ChangeType>, locked: bool) -> ReviewStatus {
    if file_name.starts_with('~') {
        return ReviewStatus::InUse;
    }
    match pending {
        Some(ChangeType::New) => ReviewStatus::New,
        Some(_) => ReviewStatus::Updated,
        None if locked => ReviewStatus::Locked,
        None => ReviewStatus::NoChanges,
    }
}

/// A registered project with the counts used to order the project list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectOverview {
    pub job: String,
    pub directory: PathBuf,
    pub due_date: Option<NaiveDate>,
    /// Paths with any pending event, deletions included
    pub unread: u64,
    pub tracked_files: u64,
}

/// Sort unread first, then larger projects, then earliest due date
///
/// Projects without a due date sort after every dated project with the same
/// counts. Ties fall back to the job identifier so the order is stable.
pub fn order_projects(projects: &mut [ProjectOverview]) {
    projects.sort_by(|a, b| {
        b.unread
            .cmp(&a.unread)
            .then_with(|| b.tracked_files.cmp(&a.tracked_files))
            .then_with(|| compare_due(a.due_date, b.due_date))
            .then_with(|| a.job.cmp(&b.job))
    });
}

fn compare_due(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
