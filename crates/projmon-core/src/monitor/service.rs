//! Monitor service: scans projects and answers review queries
//!
//! The service owns its connection factory and hasher. Every scan opens its
//! own connection and writes through one IMMEDIATE transaction, so the
//! inventory, ledger and history row for a scan land together or not at all.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use rusqlite::TransactionBehavior;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::MonitorError;
use super::classify::{ChangeClassifier, PlannedChange};
use super::review::{self, ProjectOverview, ReviewEntry};
use crate::config::MonitorConfig;
use crate::registry::ProjectRegistry;
use crate::scanner::{DirectoryScanner, HashComputer};
use crate::store::model::{
    ChangeEvent, ChangeType, DedupReport, PendingChange, ScanHistoryRecord, StoreStats,
};
use crate::store::schema::ensure_schema;
use crate::store::{ConnectionManager, Store, StoreError};

// ============================================================================
// Scan results
// ============================================================================

/// Why a scan did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No database connection could be opened this cycle
    StoreUnavailable,
    /// The project's root directory does not exist
    RootMissing,
    /// The registry has no project with that job identifier
    UnknownJob,
}

/// Totals for one committed scan
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanSummary {
    pub job: String,
    pub scanned_at: DateTime<Utc>,
    pub files_scanned: usize,
    pub changes_detected: usize,
    pub new_files: usize,
    pub updated_files: usize,
    pub deleted_files: usize,
    #[serde(serialize_with = "serialize_secs")]
    pub duration: Duration,
}

/// Result of asking for one project scan
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanOutcome {
    Completed(ScanSummary),
    Skipped(SkipReason),
}

impl ScanOutcome {
    /// Changes recorded, zero when skipped
    #[must_use]
    pub fn changes_detected(&self) -> usize {
        match self {
            Self::Completed(summary) => summary.changes_detected,
            Self::Skipped(_) => 0,
        }
    }
}

/// Progress of a scan over every project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanProgress {
    pub job: String,
    /// One-based position in the registry order
    pub index: usize,
    pub total: usize,
}

/// Totals for a scan over every project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanAllReport {
    pub scanned: usize,
    pub skipped_missing: usize,
    /// Jobs whose scan failed or could not reach the store
    pub failed: Vec<String>,
    pub total_changes: usize,
}

fn serialize_secs<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

// ============================================================================
// Service
// ============================================================================

/// Entry point for scanning and reviewing monitored projects
#[derive(Clone)]
pub struct MonitorService {
    config: MonitorConfig,
    connections: ConnectionManager,
    registry: Arc<dyn ProjectRegistry>,
    hasher: HashComputer,
}

impl std::fmt::Debug for MonitorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorService")
            .field("database", &self.connections.path())
            .field("hasher", &self.hasher)
            .finish_non_exhaustive()
    }
}

impl MonitorService {
    /// Open the service and run startup maintenance
    ///
    /// Creates missing tables and columns, then collapses duplicate pending
    /// events left by earlier runs.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid, the database cannot
    /// be opened, or maintenance fails.
    pub fn open(
        config: MonitorConfig,
        registry: Arc<dyn ProjectRegistry>,
    ) -> Result<Self, MonitorError> {
        config.validate()?;

        let service = Self {
            connections: ConnectionManager::from_config(&config),
            hasher: HashComputer::new(config.hash_retry).with_chunk_size(config.hash_chunk_size),
            config,
            registry,
        };

        let report = service.maintain()?;
        info!(
            database = %service.connections.path().display(),
            duplicates_removed = report.total(),
            "Project monitor started"
        );
        Ok(service)
    }

    /// Replace the hasher, e.g. to change how files are opened
    #[must_use]
    pub fn with_hasher(mut self, hasher: HashComputer) -> Self {
        self.hasher = hasher;
        self
    }

    #[must_use]
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &dyn ProjectRegistry {
        self.registry.as_ref()
    }

    #[must_use]
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Ensure the schema and collapse duplicate pending events
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or a statement fails.
    pub fn maintain(&self) -> Result<DedupReport, MonitorError> {
        let conn = self.connections.try_acquire()?;
        let migration = ensure_schema(&conn)?;
        if !migration.added_columns.is_empty() {
            info!(columns = ?migration.added_columns, "Migrated monitor schema");
        }

        let report = Store::new(&conn).collapse_duplicates()?;
        if report.duplicate_changes > 0 {
            info!(count = report.duplicate_changes, "Removed duplicate change records");
        }
        if report.duplicate_deletions > 0 {
            info!(count = report.duplicate_deletions, "Removed duplicate deletion records");
        }
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Scanning
    // ------------------------------------------------------------------------

    /// Scan the project registered for `job`
    ///
    /// # Errors
    /// Returns an error if the registry cannot be read or the scan's
    /// transaction fails.
    pub fn scan_project(&self, job: &str) -> Result<ScanOutcome, MonitorError> {
        let Some(project) = self.registry.lookup(job)? else {
            warn!(job, "No project registered for job");
            return Ok(ScanOutcome::Skipped(SkipReason::UnknownJob));
        };
        self.scan_root(&project.job, &project.directory)
    }

    /// Scan `root` as the files of `job`
    ///
    /// The walk and hashing happen before the database is opened, so the
    /// write lock is only held for the diff and its writes.
    ///
    /// # Errors
    /// Returns an error if any statement of the scan's transaction fails.
    pub fn scan_root(&self, job: &str, root: &Path) -> Result<ScanOutcome, MonitorError> {
        if !root.is_dir() {
            debug!(job, root = %root.display(), "Project directory missing, skipping");
            return Ok(ScanOutcome::Skipped(SkipReason::RootMissing));
        }

        let started = Instant::now();
        let snapshot = DirectoryScanner::new(root, self.hasher.clone()).scan();

        let Some(mut conn) = self.connections.acquire() else {
            warn!(job, "Database unavailable, skipping scan this cycle");
            return Ok(ScanOutcome::Skipped(SkipReason::StoreUnavailable));
        };

        let scanned_at = Utc::now();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let store = Store::new(&tx);

        let prior = store.inventory(job)?;
        let pending_deletions = store.pending_deletions(job)?;
        let plan =
            ChangeClassifier::new(job, scanned_at).classify(&snapshot, &prior, &pending_deletions);

        for record in &plan.upserts {
            store.upsert_file(record)?;
        }
        for path in &plan.removals {
            store.remove_file(job, path)?;
        }
        for planned in &plan.changes {
            store.record_change(job, &planned.change, scanned_at)?;
        }

        let summary = ScanSummary {
            job: job.to_string(),
            scanned_at,
            files_scanned: snapshot.files_scanned(),
            changes_detected: plan.changes_detected(),
            new_files: plan.of_type(ChangeType::New).count(),
            updated_files: plan.of_type(ChangeType::Updated).count(),
            deleted_files: plan.of_type(ChangeType::Deleted).count(),
            duration: started.elapsed(),
        };
        store.record_scan(
            job,
            scanned_at,
            summary.files_scanned as u64,
            summary.changes_detected as u64,
            summary.duration,
        )?;
        tx.commit()?;

        for planned in &plan.changes {
            log_change(job, planned);
        }
        if summary.changes_detected > 0 {
            info!(
                job,
                files = summary.files_scanned,
                changes = summary.changes_detected,
                "Scan complete"
            );
        } else {
            debug!(job, files = summary.files_scanned, "Scan complete, no changes");
        }

        Ok(ScanOutcome::Completed(summary))
    }

    /// Scan every registered project in job order
    ///
    /// Missing directories are counted and skipped. A failing project is
    /// logged and recorded in the report; the run carries on with the next.
    ///
    /// # Errors
    /// Returns an error only if the registry cannot be read.
    pub fn scan_all(
        &self,
        mut progress: impl FnMut(&ScanProgress),
    ) -> Result<ScanAllReport, MonitorError> {
        let mut projects = self.registry.projects()?;
        projects.sort_by(|a, b| a.job.cmp(&b.job));

        let mut report = ScanAllReport::default();
        projects.retain(|project| {
            let present = project.directory.is_dir();
            if !present {
                debug!(job = %project.job, "Project directory missing, skipping");
                report.skipped_missing += 1;
            }
            present
        });
        let total = projects.len();

        for (position, project) in projects.iter().enumerate() {
            progress(&ScanProgress {
                job: project.job.clone(),
                index: position + 1,
                total,
            });

            match self.scan_root(&project.job, &project.directory) {
                Ok(ScanOutcome::Completed(summary)) => {
                    report.scanned += 1;
                    report.total_changes += summary.changes_detected;
                }
                Ok(ScanOutcome::Skipped(SkipReason::RootMissing)) => report.skipped_missing += 1,
                Ok(ScanOutcome::Skipped(reason)) => {
                    warn!(job = %project.job, ?reason, "Project scan skipped");
                    report.failed.push(project.job.clone());
                }
                Err(err) => {
                    error!(job = %project.job, error = %err, "Project scan failed");
                    report.failed.push(project.job.clone());
                }
            }

            if position + 1 < total {
                thread::sleep(self.config.project_pause());
            }
        }

        info!(
            scanned = report.scanned,
            skipped = report.skipped_missing,
            failed = report.failed.len(),
            changes = report.total_changes,
            "Scan of all projects complete"
        );
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Review queries
    // ------------------------------------------------------------------------

    /// Pending non-deletion changes for a job, newest first
    ///
    /// # Errors
    /// Returns an error if the database cannot be read.
    pub fn pending_changes(&self, job: &str) -> Result<Vec<PendingChange>, MonitorError> {
        self.read(|store| store.pending_changes(job))
    }

    /// Number of distinct files awaiting review for a job
    ///
    /// # Errors
    /// Returns an error if the database cannot be read.
    pub fn pending_review_count(&self, job: &str) -> Result<u64, MonitorError> {
        self.read(|store| store.pending_review_count(job))
    }

    /// Ledger rows for a job, newest first
    ///
    /// # Errors
    /// Returns an error if the database cannot be read.
    pub fn changes(
        &self,
        job: &str,
        include_acknowledged: bool,
    ) -> Result<Vec<ChangeEvent>, MonitorError> {
        self.read(|store| store.changes(job, include_acknowledged))
    }

    /// Every tracked file of a job with its review status
    ///
    /// # Errors
    /// Returns an error if the database cannot be read.
    pub fn review_listing(&self, job: &str) -> Result<Vec<ReviewEntry>, MonitorError> {
        self.read(|store| {
            let inventory = store.inventory_by_modified(job)?;
            let pending = store.pending_changes(job)?;
            Ok(review::review_listing(&inventory, &pending))
        })
    }

    /// Registered projects ordered for review
    ///
    /// # Errors
    /// Returns an error if the registry or the database cannot be read.
    pub fn ordered_projects(&self) -> Result<Vec<ProjectOverview>, MonitorError> {
        let projects = self.registry.projects()?;
        let (unread, tracked) =
            self.read(|store| Ok((store.unread_counts()?, store.tracked_file_counts()?)))?;

        let mut overview: Vec<ProjectOverview> = projects
            .into_iter()
            .map(|project| ProjectOverview {
                unread: unread.get(&project.job).copied().unwrap_or(0),
                tracked_files: tracked.get(&project.job).copied().unwrap_or(0),
                job: project.job,
                directory: project.directory,
                due_date: project.due_date,
            })
            .collect();
        review::order_projects(&mut overview);
        Ok(overview)
    }

    /// Most recent scans of a job, newest first
    ///
    /// # Errors
    /// Returns an error if the database cannot be read.
    pub fn scan_history(
        &self,
        job: &str,
        limit: usize,
    ) -> Result<Vec<ScanHistoryRecord>, MonitorError> {
        self.read(|store| store.scan_history(job, limit))
    }

    /// Row counts across the store
    ///
    /// # Errors
    /// Returns an error if the database cannot be read.
    pub fn stats(&self) -> Result<StoreStats, MonitorError> {
        self.read(|store| {
            let files_per_job = store.tracked_file_counts()?;
            let (total_changes, pending_changes) = store.ledger_totals()?;
            Ok(StoreStats {
                total_files: files_per_job.values().sum(),
                files_per_job,
                total_changes,
                pending_changes,
                scans_recorded: store.scans_recorded()?,
            })
        })
    }

    // ------------------------------------------------------------------------
    // Acknowledgment
    // ------------------------------------------------------------------------

    /// Mark pending events for one path as reviewed
    ///
    /// With a change type only events of that type are acknowledged.
    ///
    /// # Errors
    /// Returns an error if the database cannot be written.
    pub fn acknowledge(
        &self,
        job: &str,
        relative_path: &str,
        change_type: Option<ChangeType>,
    ) -> Result<usize, MonitorError> {
        let count = self.read(|store| store.acknowledge(job, relative_path, change_type))?;
        debug!(job, path = relative_path, count, "Acknowledged changes");
        Ok(count)
    }

    /// Mark every pending event of a job as reviewed
    ///
    /// # Errors
    /// Returns an error if the database cannot be written.
    pub fn acknowledge_job(&self, job: &str) -> Result<usize, MonitorError> {
        let count = self.read(|store| store.acknowledge_job(job))?;
        info!(job, count, "Acknowledged all changes for job");
        Ok(count)
    }

    /// Mark every pending event of every job as reviewed
    ///
    /// Used to reset the baseline after a burst of false positives.
    ///
    /// # Errors
    /// Returns an error if the database cannot be written.
    pub fn acknowledge_everything(&self) -> Result<usize, MonitorError> {
        let count = self.read(|store| store.acknowledge_all())?;
        info!(count, "Cleared all unacknowledged changes");
        Ok(count)
    }

    fn read<T>(
        &self,
        query: impl FnOnce(Store<'_>) -> Result<T, StoreError>,
    ) -> Result<T, MonitorError> {
        let conn = self.connections.try_acquire()?;
        Ok(query(Store::new(&conn))?)
    }
}

fn log_change(job: &str, planned: &PlannedChange) {
    info!(
        "JOB:{} | {} | {} | {}",
        job,
        planned.change.change_type.as_str().to_uppercase(),
        planned.change.relative_path,
        planned.detail
    );
}
