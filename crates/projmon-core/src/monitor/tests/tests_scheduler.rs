//! Tests for scan scheduling and the background poll loop

#![allow(clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use super::Workspace;
use crate::monitor::{MonitorService, ScanOutcome, ScanScheduler};
use crate::registry::{ProjectRegistry, ProjectRoot, RegistryError};

fn fast_config(ws: &Workspace) -> crate::config::MonitorConfig {
    ws.config()
        .with_poll_interval(Duration::from_millis(10))
        .with_error_backoff(Duration::from_millis(30))
}

/// Poll `condition` until it holds or two seconds pass
async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Registry that fails, then panics, then serves one project
#[derive(Debug)]
struct TroubledRegistry {
    project: ProjectRoot,
    calls: AtomicUsize,
}

impl ProjectRegistry for TroubledRegistry {
    fn projects(&self) -> Result<Vec<ProjectRoot>, RegistryError> {
        match self.calls.fetch_add(1, Ordering::SeqCst) {
            0 => Err(RegistryError::Unavailable("registry offline".to_string())),
            1 => panic!("registry exploded"),
            _ => Ok(vec![self.project.clone()]),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scan_project_runs_on_blocking_pool() {
    let ws = Workspace::new();
    ws.write("J1", "a.txt", "alpha");
    let scheduler = ScanScheduler::new(Arc::new(ws.service(&["J1"])));

    let outcome = scheduler.scan_project("J1").await.expect("Scan failed");

    assert_eq!(outcome.changes_detected(), 1);
    assert!(matches!(outcome, ScanOutcome::Completed(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_scan_all_reports_progress() {
    let ws = Workspace::new();
    ws.write("J1", "a.txt", "alpha");
    ws.write("J2", "b.txt", "bravo");
    let scheduler = ScanScheduler::new(Arc::new(ws.service(&["J1", "J2"])));
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);

    let report = scheduler
        .scan_all(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await
        .expect("Scan all failed");

    assert_eq!(report.scanned, 2);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_background_scans_focused_project() {
    let ws = Workspace::new();
    ws.write("J1", "a.txt", "alpha");
    ws.write("J2", "b.txt", "bravo");
    let service = Arc::new(ws.service_with(fast_config(&ws), {
        let registry = crate::registry::StaticRegistry::new([
            ProjectRoot::new("J1", ws.project_dir("J1")),
            ProjectRoot::new("J2", ws.project_dir("J2")),
        ]);
        Arc::new(registry)
    }));
    let scheduler = ScanScheduler::new(Arc::clone(&service));
    let (focus_tx, focus_rx) = watch::channel(Some("J1".to_string()));

    let handle = scheduler.start_background(focus_rx);
    assert!(handle.is_running());

    let scanned = eventually(|| service.scan_history("J1", 1).is_ok_and(|h| !h.is_empty())).await;
    assert!(scanned, "focused project should be scanned");
    assert!(service.scan_history("J2", 1).expect("Query failed").is_empty());

    focus_tx.send_replace(Some("J2".to_string()));
    let switched = eventually(|| service.scan_history("J2", 1).is_ok_and(|h| !h.is_empty())).await;
    assert!(switched, "focus change should be picked up");

    handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_background_idles_without_focus() {
    let ws = Workspace::new();
    ws.write("J1", "a.txt", "alpha");
    let service = Arc::new(ws.service_with(fast_config(&ws), {
        Arc::new(crate::registry::StaticRegistry::new([ProjectRoot::new(
            "J1",
            ws.project_dir("J1"),
        )]))
    }));
    let (_focus_tx, focus_rx) = watch::channel(None);

    let handle = ScanScheduler::new(Arc::clone(&service)).start_background(focus_rx);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(handle.is_running());
    assert!(service.scan_history("J1", 1).expect("Query failed").is_empty());
    handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_background_survives_errors_and_panics() {
    let ws = Workspace::new();
    ws.write("J1", "a.txt", "alpha");
    let registry = Arc::new(TroubledRegistry {
        project: ProjectRoot::new("J1", ws.project_dir("J1")),
        calls: AtomicUsize::new(0),
    });
    let service: Arc<MonitorService> =
        Arc::new(ws.service_with(fast_config(&ws), Arc::clone(&registry) as Arc<dyn ProjectRegistry>));
    let (_focus_tx, focus_rx) = watch::channel(Some("J1".to_string()));

    let handle = ScanScheduler::new(Arc::clone(&service)).start_background(focus_rx);

    let recovered = eventually(|| service.scan_history("J1", 1).is_ok_and(|h| !h.is_empty())).await;
    assert!(recovered, "loop should resume after an error and a panic");
    assert!(registry.calls.load(Ordering::SeqCst) >= 3);
    assert!(handle.is_running());

    handle.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stop_is_prompt_during_long_interval() {
    let ws = Workspace::new();
    let config = ws.config().with_poll_interval(Duration::from_secs(3600));
    let service = Arc::new(ws.service_with(
        config,
        Arc::new(crate::registry::StaticRegistry::default()),
    ));
    let (_focus_tx, focus_rx) = watch::channel(Some("J1".to_string()));
    let handle = ScanScheduler::new(service).start_background(focus_rx);

    let stopped = tokio::time::timeout(Duration::from_secs(2), handle.stop()).await;

    assert!(stopped.is_ok(), "stop should cancel the pending sleep");
}
