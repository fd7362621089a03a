//! projmon-core: Core library for the project file change monitor
//!
//! Repeatedly walks project directory trees, compares each walk against a
//! persisted per-file inventory, and records new, updated and deleted files
//! in a change ledger that reviewers acknowledge.
//!
//! # Components
//!
//! - **scanner** - directory walking and lock-tolerant content hashing
//! - **store** - SQLite inventory, change ledger and scan history
//! - **monitor** - change classification, the scan service and its scheduler
//! - **registry** - the job to root directory mapping supplied by the host

pub mod config;
pub mod monitor;
pub mod registry;
pub mod retry;
pub mod scanner;
pub mod store;

// Re-export commonly used types
pub use config::MonitorConfig;
pub use monitor::{
    BackgroundHandle, ChangeClassifier, MonitorError, MonitorService, ScanOutcome,
    ScanScheduler, ScanSummary,
};
pub use registry::{ProjectRegistry, ProjectRoot, StaticRegistry};
pub use retry::RetryPolicy;
pub use scanner::{DirectoryScanner, FileDigest, HashComputer, Snapshot};
pub use store::model::{ChangeEvent, ChangeType, FileRecord, ScanHistoryRecord};
pub use store::{ConnectionManager, Store, StoreError};
