//! Review commands: Print pending changes, file status, projects and history

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use projmon_core::MonitorService;

use crate::types::OutputFormat;

/// A read-only listing to print
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewQuery {
    Changes { job: String, all: bool },
    Files { job: String },
    Projects,
    History { job: String, limit: usize },
    Stats,
}

/// Run a review listing
///
/// # Errors
/// Returns an error if the database cannot be read.
pub fn run(service: &MonitorService, query: &ReviewQuery, format: OutputFormat) -> Result<()> {
    match query {
        ReviewQuery::Changes { job, all } if *all => print_ledger(service, job, format),
        ReviewQuery::Changes { job, .. } => print_pending(service, job, format),
        ReviewQuery::Files { job } => print_files(service, job, format),
        ReviewQuery::Projects => print_projects(service, format),
        ReviewQuery::History { job, limit } => print_history(service, job, *limit, format),
        ReviewQuery::Stats => print_stats(service, format),
    }
}

fn print_pending(service: &MonitorService, job: &str, format: OutputFormat) -> Result<()> {
    let pending = service.pending_changes(job)?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&pending)?);
        return Ok(());
    }

    if pending.is_empty() {
        println!("No changes awaiting review for {job}");
        return Ok(());
    }

    println!("\n{:<60} {:<10} CHANGED", "FILE", "TYPE");
    println!("{}", "-".repeat(92));
    for change in &pending {
        println!(
            "{:<60} {:<10} {}",
            truncate_path(&change.relative_path, 60),
            change.change_type,
            format_timestamp(change.changed_at)
        );
    }
    println!(
        "\n{} files awaiting review",
        service.pending_review_count(job)?
    );
    Ok(())
}

fn print_ledger(service: &MonitorService, job: &str, format: OutputFormat) -> Result<()> {
    let events = service.changes(job, true)?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }

    println!("\n{:<8} {:<50} {:<10} {:<20} ACK", "ID", "FILE", "TYPE", "CHANGED");
    println!("{}", "-".repeat(96));
    for event in &events {
        println!(
            "{:<8} {:<50} {:<10} {:<20} {}",
            event.id,
            truncate_path(&event.relative_path, 50),
            event.change_type,
            format_timestamp(event.changed_at),
            if event.acknowledged { "yes" } else { "no" }
        );
    }
    println!("\n{} ledger entries", events.len());
    Ok(())
}

fn print_files(service: &MonitorService, job: &str, format: OutputFormat) -> Result<()> {
    let listing = service.review_listing(job)?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if listing.is_empty() {
        println!("No files found for project {job} - run 'projmon scan {job}' first");
        return Ok(());
    }

    println!("\n{:<40} {:<50} {:<20} STATUS", "NAME", "PATH", "MODIFIED");
    println!("{}", "-".repeat(124));
    for entry in &listing {
        println!(
            "{:<40} {:<50} {:<20} {}",
            truncate_str(&entry.file_name, 40),
            truncate_path(&entry.relative_path, 50),
            format_timestamp(entry.modified),
            entry.status
        );
    }

    let changed = listing.iter().filter(|e| e.status.is_changed()).count();
    println!("\nLoaded {} files ({changed} with changes) for project {job}", listing.len());
    Ok(())
}

fn print_projects(service: &MonitorService, format: OutputFormat) -> Result<()> {
    let projects = service.ordered_projects()?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
        return Ok(());
    }

    println!("\n{:<20} {:<8} {:<8} {:<12} DIRECTORY", "JOB", "UNREAD", "FILES", "DUE");
    println!("{}", "-".repeat(100));
    for project in &projects {
        let due = project
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!(
            "{:<20} {:<8} {:<8} {:<12} {}",
            truncate_str(&project.job, 20),
            project.unread,
            project.tracked_files,
            due,
            truncate_path(&project.directory.display().to_string(), 50)
        );
    }
    Ok(())
}

fn print_history(
    service: &MonitorService,
    job: &str,
    limit: usize,
    format: OutputFormat,
) -> Result<()> {
    let history = service.scan_history(job, limit)?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&history)?);
        return Ok(());
    }

    println!("\n{:<20} {:<8} {:<8} DURATION", "SCANNED", "FILES", "CHANGES");
    println!("{}", "-".repeat(50));
    for scan in &history {
        println!(
            "{:<20} {:<8} {:<8} {:.2}s",
            format_timestamp(scan.scanned_at),
            scan.files_scanned,
            scan.changes_detected,
            scan.duration_secs
        );
    }
    Ok(())
}

fn print_stats(service: &MonitorService, format: OutputFormat) -> Result<()> {
    let stats = service.stats()?;
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\nMonitor Statistics:");
    println!("  Tracked files:   {}", stats.total_files);
    println!("  Ledger entries:  {}", stats.total_changes);
    println!("  Pending changes: {}", stats.pending_changes);
    println!("  Scans recorded:  {}", stats.scans_recorded);
    if !stats.files_per_job.is_empty() {
        println!("\nFiles per job:");
        for (job, count) in &stats.files_per_job {
            println!("  {job:<20} {count}");
        }
    }
    Ok(())
}

/// Local time for display, or `-` when unknown
#[must_use]
pub fn format_timestamp(timestamp: Option<DateTime<Utc>>) -> String {
    timestamp.map_or_else(
        || "-".to_string(),
        |ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Shorten `s` to `max_len` characters, marking the cut with `...`
#[must_use]
pub fn truncate_str(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Shorten a path from the front, keeping the file name visible
#[must_use]
pub fn truncate_path(path: &str, max_len: usize) -> String {
    let count = path.chars().count();
    if count <= max_len {
        path.to_string()
    } else {
        let kept: String = path.chars().skip(count - max_len.saturating_sub(3)).collect();
        format!("...{kept}")
    }
}
