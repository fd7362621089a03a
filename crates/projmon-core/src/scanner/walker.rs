//! Directory walker: Builds a metadata snapshot of a project root

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use ignore::WalkBuilder;
use tracing::{debug, warn};

use super::filter::is_ignored_name;
use super::hash::{FileDigest, HashComputer};

/// Everything observed about one file during a walk
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    pub file_name: String,
    /// Extension including the leading dot, or empty
    pub extension: String,
    /// Parent directory relative to the project root, `/` separated
    pub parent_path: String,
    pub size: u64,
    /// Normalized creation time, never later than `modified`
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    pub digest: FileDigest,
}

/// Result of walking one project root, keyed by `/` separated relative path
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    /// Files that were described successfully
    pub files: BTreeMap<String, FileMetadata>,
    /// Files that were seen but whose metadata could not be read this cycle
    pub unreadable: BTreeSet<String>,
}

impl Snapshot {
    /// Number of files seen, including unreadable ones
    #[must_use]
    pub fn files_scanned(&self) -> usize {
        self.files.len() + self.unreadable.len()
    }

    /// True when `relative_path` was seen on disk
    #[must_use]
    pub fn contains(&self, relative_path: &str) -> bool {
        self.files.contains_key(relative_path) || self.unreadable.contains(relative_path)
    }
}

/// Walks a project root and hashes every regular file
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    root: PathBuf,
    hasher: HashComputer,
}

impl DirectoryScanner {
    /// Create a scanner for the given root directory
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, hasher: HashComputer) -> Self {
        Self {
            root: root.into(),
            hasher,
        }
    }

    /// Get the root directory being scanned
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the root and describe every project file
    ///
    /// Unreadable directories are logged and skipped; a file whose metadata
    /// cannot be read is recorded in `Snapshot::unreadable`.
    #[must_use]
    pub fn scan(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();

        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(root = %self.root.display(), error = %err, "Skipping unreadable entry");
                    continue;
                }
            };
            if !is_project_file(&entry) {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if is_ignored_name(&name) {
                continue;
            }
            let Some(relative) = relative_key(&self.root, entry.path()) else {
                continue;
            };

            match self.describe(entry.path(), name, &relative) {
                Ok(metadata) => {
                    snapshot.files.insert(relative, metadata);
                }
                Err(err) => {
                    debug!(path = %relative, error = %err, "Skipping file");
                    snapshot.unreadable.insert(relative);
                }
            }
        }

        snapshot
    }

    fn describe(&self, path: &Path, file_name: String, relative: &str) -> io::Result<FileMetadata> {
        let metadata = fs::metadata(path)?;
        let modified = metadata.modified()?;
        let created = normalize_created(change_time(&metadata), modified);
        let digest = self.hasher.compute(path);

        let extension = Path::new(&file_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        let parent_path = relative
            .rsplit_once('/')
            .map(|(parent, _)| parent.to_string())
            .unwrap_or_default();

        Ok(FileMetadata {
            file_name,
            extension,
            parent_path,
            size: metadata.len(),
            created,
            modified: DateTime::<Utc>::from(modified),
            digest,
        })
    }
}

/// Regular files, plus links whose target is a regular file
///
/// Directory links are never followed, so the walk cannot loop.
fn is_project_file(entry: &ignore::DirEntry) -> bool {
    match entry.file_type() {
        Some(ft) if ft.is_file() => true,
        Some(ft) if ft.is_symlink() => {
            fs::metadata(entry.path()).is_ok_and(|meta| meta.is_file())
        }
        _ => false,
    }
}

/// Derive a creation time that is never later than the modification time
///
/// The observed change time can postdate the last write (metadata-only
/// changes, copies that preserve mtime), so the earlier of the two wins.
#[must_use]
pub fn normalize_created(change_time: Option<SystemTime>, modified: SystemTime) -> DateTime<Utc> {
    let created = change_time.map_or(modified, |changed| changed.min(modified));
    DateTime::<Utc>::from(created.min(modified))
}

#[cfg(unix)]
fn change_time(metadata: &fs::Metadata) -> Option<SystemTime> {
    use std::os::unix::fs::MetadataExt;
    use std::time::{Duration, UNIX_EPOCH};

    let nanos = u32::try_from(metadata.ctime_nsec()).unwrap_or(0);
    match u64::try_from(metadata.ctime()) {
        Ok(secs) => UNIX_EPOCH.checked_add(Duration::new(secs, nanos)),
        Err(_) => UNIX_EPOCH.checked_sub(Duration::from_secs(metadata.ctime().unsigned_abs())),
    }
}

#[cfg(not(unix))]
fn change_time(metadata: &fs::Metadata) -> Option<SystemTime> {
    metadata.created().ok()
}

/// `/` separated path of `path` relative to `root`
fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}
