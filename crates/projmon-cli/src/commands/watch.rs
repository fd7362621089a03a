//! Watch command: Poll one project until interrupted

use std::sync::Arc;

use anyhow::Result;
use projmon_core::{MonitorService, ScanScheduler};
use tokio::sync::watch;
use tracing::info;

/// Run the watch command
///
/// # Errors
/// Returns an error if the interrupt handler cannot be installed.
pub async fn run(service: Arc<MonitorService>, job: &str) -> Result<()> {
    let interval = service.config().poll_interval();
    let scheduler = ScanScheduler::new(service);
    let (_focus, focus_rx) = watch::channel(Some(job.to_string()));

    let handle = scheduler.start_background(focus_rx);
    info!(
        "Watching {} every {:.1}s, press Ctrl-C to stop",
        job,
        interval.as_secs_f64()
    );

    let interrupted = tokio::signal::ctrl_c().await;
    handle.stop().await;
    interrupted?;
    Ok(())
}
