//! Scan command: Run one project scan or a scan of every project

use std::sync::Arc;

use anyhow::Result;
use projmon_core::monitor::{ScanAllReport, ScanProgress, SkipReason};
use projmon_core::{MonitorService, ScanOutcome, ScanScheduler};
use tracing::info;

/// Run the scan command
///
/// # Errors
/// Returns an error if the scan fails.
pub async fn run(service: Arc<MonitorService>, job: Option<&str>, all: bool) -> Result<()> {
    let scheduler = ScanScheduler::new(service);

    if all {
        let report = scheduler.scan_all(log_progress).await?;
        print_report(&report);
        return Ok(());
    }

    let Some(job) = job else {
        anyhow::bail!("A job identifier or --all is required");
    };
    match scheduler.scan_project(job).await? {
        ScanOutcome::Completed(summary) => {
            println!(
                "Scanned {}: {} files, {} changes ({} new, {} updated, {} deleted) in {:.2}s",
                summary.job,
                summary.files_scanned,
                summary.changes_detected,
                summary.new_files,
                summary.updated_files,
                summary.deleted_files,
                summary.duration.as_secs_f64()
            );
        }
        ScanOutcome::Skipped(reason) => {
            println!("Skipped {job}: {}", describe_skip(reason));
        }
    }
    Ok(())
}

fn log_progress(progress: &ScanProgress) {
    info!(
        "Scanning project {} ({}/{})...",
        progress.job, progress.index, progress.total
    );
}

fn print_report(report: &ScanAllReport) {
    println!(
        "Scan complete. Found {} changes across {} projects.",
        report.total_changes, report.scanned
    );
    if report.skipped_missing > 0 {
        println!("Skipped {} projects with missing directories", report.skipped_missing);
    }
    if !report.failed.is_empty() {
        println!("Failed: {}", report.failed.join(", "));
    }
}

/// Human-readable reason for a skipped scan
#[must_use]
pub fn describe_skip(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::StoreUnavailable => "database is locked, try again shortly",
        SkipReason::RootMissing => "project directory does not exist",
        SkipReason::UnknownJob => "no project registered with that job",
    }
}
