//! Maintain command: Collapse duplicates and optionally reset the baseline

use anyhow::Result;
use projmon_core::MonitorService;
use projmon_core::store::model::DedupReport;

/// Run the maintain command
///
/// # Errors
/// Returns an error if the database cannot be written.
pub fn run(service: &MonitorService, reset: bool) -> Result<DedupReport> {
    let report = service.maintain()?;
    println!(
        "Removed {} duplicate changes and {} duplicate deletions",
        report.duplicate_changes, report.duplicate_deletions
    );

    if reset {
        let cleared = service.acknowledge_everything()?;
        println!("Cleared {cleared} unacknowledged changes. Future scans report only real changes.");
    }
    Ok(report)
}
