//! Content hashing with bounded retries for locked files

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;
use std::thread;

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::retry::RetryPolicy;

/// Stored in place of a digest when a file stayed locked through every retry
pub const LOCKED_SENTINEL: &str = "locked_file";

/// Default read buffer for hashing
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Outcome of hashing one file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileDigest {
    /// SHA-256 of the content, lowercase hex
    Hash(String),
    /// Another process kept the file locked
    Locked,
    /// The file could not be read for any other reason
    Unreadable,
}

impl FileDigest {
    /// Value written to the `file_hash` column
    #[must_use]
    pub fn as_stored(&self) -> &str {
        match self {
            Self::Hash(hex) => hex,
            Self::Locked => LOCKED_SENTINEL,
            Self::Unreadable => "",
        }
    }

    /// Interpret a `file_hash` column value
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        match value {
            LOCKED_SENTINEL => Self::Locked,
            "" => Self::Unreadable,
            hex => Self::Hash(hex.to_string()),
        }
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }
}

impl fmt::Display for FileDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_stored())
    }
}

impl Serialize for FileDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_stored())
    }
}

/// Opens files for hashing
///
/// The default goes straight to the filesystem; tests substitute openers
/// that simulate sharing violations.
pub trait FileOpener: fmt::Debug + Send + Sync {
    /// Open `path` for reading
    ///
    /// # Errors
    /// Returns the underlying I/O error.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>>;
}

/// Filesystem opener
#[derive(Debug, Default, Clone, Copy)]
pub struct FsOpener;

impl FileOpener for FsOpener {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(File::open(path)?))
    }
}

/// Returns true for "file in use" class errors worth retrying
#[must_use]
pub fn is_lock_error(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::WouldBlock {
        return true;
    }
    match err.raw_os_error() {
        // ERROR_SHARING_VIOLATION, ERROR_LOCK_VIOLATION
        #[cfg(windows)]
        Some(32 | 33) => true,
        // EBUSY, ETXTBSY
        #[cfg(unix)]
        Some(16 | 26) => true,
        _ => false,
    }
}

/// Streams files through SHA-256
#[derive(Debug, Clone)]
pub struct HashComputer {
    opener: Arc<dyn FileOpener>,
    retry: RetryPolicy,
    chunk_size: usize,
}

impl Default for HashComputer {
    fn default() -> Self {
        Self::new(RetryPolicy::hashing())
    }
}

impl HashComputer {
    /// Create a hasher reading from the filesystem
    #[must_use]
    pub fn new(retry: RetryPolicy) -> Self {
        Self {
            opener: Arc::new(FsOpener),
            retry,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Read files through a different opener
    #[must_use]
    pub fn with_opener(mut self, opener: impl FileOpener + 'static) -> Self {
        self.opener = Arc::new(opener);
        self
    }

    /// Set the read buffer size
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    #[must_use]
    pub fn retry(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Hash one file
    ///
    /// Lock errors are retried on the configured schedule and end in
    /// `FileDigest::Locked`; any other error yields `FileDigest::Unreadable`.
    #[must_use]
    pub fn compute(&self, path: &Path) -> FileDigest {
        let attempts = self.retry.attempts();

        for attempt in 0..attempts {
            match self.digest_once(path) {
                Ok(hex) => return FileDigest::Hash(hex),
                Err(err) if is_lock_error(&err) => {
                    if attempt + 1 == attempts {
                        warn!(path = %path.display(), "File is locked, skipping hash calculation");
                        break;
                    }
                    let delay = self.retry.delay_for(attempt);
                    debug!(
                        path = %path.display(),
                        attempt = attempt + 1,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "File is locked, retrying"
                    );
                    thread::sleep(delay);
                }
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Error reading file for hashing");
                    return FileDigest::Unreadable;
                }
            }
        }

        FileDigest::Locked
    }

    fn digest_once(&self, path: &Path) -> io::Result<String> {
        let mut reader = self.opener.open(path)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let read = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            hasher.update(&buffer[..read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }
}
