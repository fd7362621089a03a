//! Scan scheduling on the tokio runtime
//!
//! Scans are synchronous (filesystem walk plus SQLite), so every scan runs on
//! the blocking pool. The background loop polls the focused project on a
//! fixed interval until its cancellation token fires.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::MonitorError;
use super::service::{MonitorService, ScanAllReport, ScanOutcome, ScanProgress};

/// Runs scans off the async executor
#[derive(Debug, Clone)]
pub struct ScanScheduler {
    service: Arc<MonitorService>,
}

impl ScanScheduler {
    #[must_use]
    pub fn new(service: Arc<MonitorService>) -> Self {
        Self { service }
    }

    #[must_use]
    pub fn service(&self) -> &Arc<MonitorService> {
        &self.service
    }

    /// Scan one project on the blocking pool
    ///
    /// # Errors
    /// Returns the scan's error, or `MonitorError::Task` if the scan panicked.
    pub async fn scan_project(&self, job: &str) -> Result<ScanOutcome, MonitorError> {
        let service = Arc::clone(&self.service);
        let job = job.to_string();
        tokio::task::spawn_blocking(move || service.scan_project(&job))
            .await
            .map_err(|err| MonitorError::Task(err.to_string()))?
    }

    /// Scan every project on the blocking pool
    ///
    /// `progress` is called from the blocking thread before each project.
    ///
    /// # Errors
    /// Returns an error if the registry cannot be read, or
    /// `MonitorError::Task` if the run panicked.
    pub async fn scan_all<F>(&self, progress: F) -> Result<ScanAllReport, MonitorError>
    where
        F: FnMut(&ScanProgress) + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        tokio::task::spawn_blocking(move || service.scan_all(progress))
            .await
            .map_err(|err| MonitorError::Task(err.to_string()))?
    }

    /// Start polling the project named by `focus`
    ///
    /// The focus channel is owned by the caller; `None` means no project is
    /// selected and the loop just keeps its cadence.
    #[must_use]
    pub fn start_background(&self, focus: watch::Receiver<Option<String>>) -> BackgroundHandle {
        let token = CancellationToken::new();
        let task = tokio::spawn(poll_loop(
            Arc::clone(&self.service),
            focus,
            token.clone(),
        ));
        BackgroundHandle {
            token,
            task: Some(task),
        }
    }
}

/// Handle to the background poll loop
///
/// Dropping the handle cancels the loop without waiting for it.
#[derive(Debug)]
pub struct BackgroundHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl BackgroundHandle {
    /// True until the loop has exited
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the loop and wait for it to exit
    ///
    /// A scan already in progress is allowed to finish and commit.
    pub async fn stop(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "Background monitor task ended abnormally");
            }
        }
    }
}

impl Drop for BackgroundHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn poll_loop(
    service: Arc<MonitorService>,
    focus: watch::Receiver<Option<String>>,
    token: CancellationToken,
) {
    let poll_interval = service.config().poll_interval();
    let error_backoff = service.config().error_backoff();
    let mut delay = poll_interval;

    info!(interval_ms = millis(poll_interval), "Background monitoring started");

    loop {
        tokio::select! {
            () = token.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }

        let Some(job) = focus.borrow().clone() else {
            delay = poll_interval;
            continue;
        };

        let worker = Arc::clone(&service);
        let job_for_scan = job.clone();
        delay = match tokio::task::spawn_blocking(move || worker.scan_project(&job_for_scan)).await {
            Ok(Ok(ScanOutcome::Completed(summary))) => {
                debug!(job, changes = summary.changes_detected, "Background scan complete");
                poll_interval
            }
            Ok(Ok(ScanOutcome::Skipped(reason))) => {
                debug!(job, ?reason, "Background scan skipped");
                poll_interval
            }
            Ok(Err(err)) => {
                error!(job, error = %err, backoff_ms = millis(error_backoff), "Monitoring error");
                error_backoff
            }
            Err(err) => {
                error!(job, error = %err, backoff_ms = millis(error_backoff), "Monitoring task panicked");
                error_backoff
            }
        };
    }

    info!("Background monitoring stopped");
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
