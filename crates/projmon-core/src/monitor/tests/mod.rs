mod tests_detail;
mod tests_scheduler;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use crate::config::MonitorConfig;
use crate::monitor::MonitorService;
use crate::registry::{ProjectRegistry, ProjectRoot, StaticRegistry};
use crate::retry::RetryPolicy;

/// Temporary projects directory plus database
struct Workspace {
    dir: TempDir,
}

#[allow(clippy::expect_used)]
impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    fn db_path(&self) -> PathBuf {
        self.dir.path().join("monitor.db")
    }

    fn project_dir(&self, job: &str) -> PathBuf {
        let path = self.dir.path().join("projects").join(job);
        fs::create_dir_all(&path).expect("Failed to create project dir");
        path
    }

    fn write(&self, job: &str, relative: &str, content: &str) -> PathBuf {
        let path = self.project_dir(job).join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    fn config(&self) -> MonitorConfig {
        MonitorConfig::new(self.db_path())
            .with_project_pause(Duration::ZERO)
            .with_hash_retry(RetryPolicy::immediate(3))
            .with_connection_retry(RetryPolicy::immediate(2))
    }

    fn service(&self, jobs: &[&str]) -> MonitorService {
        let registry = StaticRegistry::new(
            jobs.iter()
                .map(|job| ProjectRoot::new(*job, self.project_dir(job))),
        );
        self.service_with(self.config(), Arc::new(registry))
    }

    fn service_with(
        &self,
        config: MonitorConfig,
        registry: Arc<dyn ProjectRegistry>,
    ) -> MonitorService {
        MonitorService::open(config, registry).expect("Failed to open service")
    }
}

/// Move a file's mtime relative to its current value
#[allow(clippy::expect_used)]
fn shift_mtime(path: &Path, secs: i64) {
    let metadata = fs::metadata(path).expect("Failed to stat file");
    let current = filetime::FileTime::from_last_modification_time(&metadata);
    let shifted = filetime::FileTime::from_unix_time(current.unix_seconds() + secs, current.nanoseconds());
    filetime::set_file_mtime(path, shifted).expect("Failed to set mtime");
}
