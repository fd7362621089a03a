//! Service construction from the config file and command-line overrides

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use projmon_core::config::ConfigFile;
use projmon_core::{MonitorService, StaticRegistry};
use tracing::debug;

use crate::types::GlobalOptions;

/// Config file read when `--config` is not given, if present
pub const DEFAULT_CONFIG: &str = "projmon.toml";

/// Load the configuration named by the options
///
/// An explicit `--config` must exist. Without one, `projmon.toml` in the
/// working directory is used when present, otherwise defaults apply.
///
/// # Errors
/// Returns an error if the config file cannot be read or is invalid.
pub fn load_config(options: &GlobalOptions) -> Result<ConfigFile> {
    let mut file = match &options.config {
        Some(path) => ConfigFile::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).is_file() => ConfigFile::load(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("Failed to load config {DEFAULT_CONFIG}"))?,
        None => {
            debug!("No config file, using defaults");
            ConfigFile::default()
        }
    };

    if let Some(db) = &options.db {
        file.monitor.database_path = PathBuf::from(db);
    }
    Ok(file)
}

/// Open the monitor service described by the options
///
/// # Errors
/// Returns an error if the config cannot be loaded or the database cannot
/// be opened.
pub fn open_service(options: &GlobalOptions) -> Result<Arc<MonitorService>> {
    let file = load_config(options)?;
    let registry = StaticRegistry::new(file.projects);
    let database = file.monitor.database_path.clone();
    let service = MonitorService::open(file.monitor, Arc::new(registry))
        .with_context(|| format!("Failed to open monitor database {}", database.display()))?;
    Ok(Arc::new(service))
}
