//! Logging setup: stderr plus an optional daily log file

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// File name prefix of the daily log
pub const LOG_FILE_PREFIX: &str = "project_monitor";

/// Filter for the requested verbosity
#[must_use]
pub fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    }
}

/// Install the global subscriber
///
/// With `log_dir` the change log is also written to a daily rolling file
/// there. The returned guard flushes that file and must be held until exit.
///
/// # Errors
/// Returns an error if a global subscriber is already installed.
pub fn setup_logging(
    verbose: bool,
    log_dir: Option<&Path>,
) -> Result<Option<WorkerGuard>, TryInitError> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(env_filter(verbose))
        .try_init()?;

    Ok(guard)
}
