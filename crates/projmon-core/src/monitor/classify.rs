//! Change classification: diff a snapshot against the stored inventory
//!
//! Classification is pure. It produces a plan of inventory writes and ledger
//! events which the service applies inside one transaction.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use super::detail::ChangeDetail;
use crate::scanner::{FileDigest, Snapshot};
use crate::store::model::{ChangeType, FileRecord, NewChange};

/// Modification times closer than this are treated as equal
const MTIME_TOLERANCE_MICROS: i64 = 1_000_000;

/// One ledger event the scan will record
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub change: NewChange,
    pub detail: ChangeDetail,
}

/// Everything one scan will write
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPlan {
    pub changes: Vec<PlannedChange>,
    /// Rows to insert or refresh, one per readable file on disk
    pub upserts: Vec<FileRecord>,
    /// Paths confirmed absent from disk
    pub removals: Vec<String>,
}

impl ScanPlan {
    #[must_use]
    pub fn changes_detected(&self) -> usize {
        self.changes.len()
    }

    /// Planned changes of one kind
    pub fn of_type(&self, change_type: ChangeType) -> impl Iterator<Item = &PlannedChange> {
        self.changes
            .iter()
            .filter(move |planned| planned.change.change_type == change_type)
    }
}

/// Classifies files of one job against its prior inventory
#[derive(Debug, Clone)]
pub struct ChangeClassifier<'a> {
    job: &'a str,
    scanned_at: DateTime<Utc>,
}

impl<'a> ChangeClassifier<'a> {
    #[must_use]
    pub fn new(job: &'a str, scanned_at: DateTime<Utc>) -> Self {
        Self { job, scanned_at }
    }

    /// Build the write plan for one scan
    ///
    /// `pending_deletions` holds paths that already have an unacknowledged
    /// deletion event; those are removed from the inventory again without a
    /// second event.
    #[must_use]
    pub fn classify(
        &self,
        snapshot: &Snapshot,
        prior: &HashMap<String, FileRecord>,
        pending_deletions: &HashSet<String>,
    ) -> ScanPlan {
        let mut plan = ScanPlan::default();

        for (path, metadata) in &snapshot.files {
            let mut record = FileRecord::from_metadata(self.job, path, metadata, self.scanned_at);

            match prior.get(path) {
                Some(previous) if metadata.digest.is_locked() => {
                    // Keep the last known content hash; only metadata is refreshed
                    record.content_hash = previous.content_hash.clone();
                }
                Some(previous) => {
                    let content_changed = metadata.digest != previous.content_hash;
                    let time_changed = mtime_differs(previous.modified, metadata.modified);
                    if content_changed || time_changed {
                        plan.changes.push(PlannedChange {
                            change: NewChange {
                                relative_path: path.clone(),
                                change_type: ChangeType::Updated,
                                old_hash: hash_column(&previous.content_hash),
                                new_hash: hash_column(&metadata.digest),
                            },
                            detail: ChangeDetail::Updated {
                                content_changed,
                                time_changed,
                            },
                        });
                    }
                }
                None if metadata.digest.is_locked() => {}
                None => plan.changes.push(PlannedChange {
                    change: NewChange {
                        relative_path: path.clone(),
                        change_type: ChangeType::New,
                        old_hash: None,
                        new_hash: hash_column(&metadata.digest),
                    },
                    detail: ChangeDetail::New {
                        size: metadata.size,
                    },
                }),
            }

            plan.upserts.push(record);
        }

        let mut missing: Vec<&FileRecord> = prior
            .values()
            .filter(|record| !snapshot.contains(&record.relative_path))
            .collect();
        missing.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        for record in missing {
            if !pending_deletions.contains(&record.relative_path) {
                plan.changes.push(PlannedChange {
                    change: NewChange {
                        relative_path: record.relative_path.clone(),
                        change_type: ChangeType::Deleted,
                        old_hash: hash_column(&record.content_hash),
                        new_hash: None,
                    },
                    detail: ChangeDetail::Deleted,
                });
            }
            plan.removals.push(record.relative_path.clone());
        }

        plan
    }
}

fn mtime_differs(previous: DateTime<Utc>, current: DateTime<Utc>) -> bool {
    (current - previous)
        .num_microseconds()
        .map_or(true, |delta| delta.abs() > MTIME_TOLERANCE_MICROS)
}

fn hash_column(digest: &FileDigest) -> Option<String> {
    Some(digest.as_stored().to_string())
}
