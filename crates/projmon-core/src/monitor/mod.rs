//! Monitor module: change classification, the monitor service and its scheduler
//!
//! `MonitorService` runs scans synchronously; `ScanScheduler` moves them onto
//! the blocking pool and drives the background poll of the focused project.

mod classify;
mod detail;
mod review;
mod scheduler;
mod service;

use thiserror::Error;

use crate::config::ConfigError;
use crate::registry::RegistryError;
use crate::store::StoreError;

pub use classify::{ChangeClassifier, PlannedChange, ScanPlan};
pub use detail::ChangeDetail;
pub use review::{ProjectOverview, ReviewEntry, ReviewStatus, order_projects, review_listing};
pub use scheduler::{BackgroundHandle, ScanScheduler};
pub use service::{
    MonitorService, ScanAllReport, ScanOutcome, ScanProgress, ScanSummary, SkipReason,
};

/// Errors surfaced by the monitor service
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Scan task failed: {0}")]
    Task(String),
}

impl From<rusqlite::Error> for MonitorError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Store(StoreError::from(err))
    }
}

#[cfg(test)]
mod tests;
