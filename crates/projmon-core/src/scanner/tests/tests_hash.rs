//! Tests for content hashing and lock handling

#![allow(clippy::expect_used)]

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tempfile::TempDir;

use crate::retry::RetryPolicy;
use crate::scanner::{FileDigest, FileOpener, FsOpener, HashComputer, LOCKED_SENTINEL, is_lock_error};

/// Opener that fails with a sharing-violation class error a fixed number of times
#[derive(Debug)]
struct FlakyOpener {
    failures: u32,
    calls: Arc<AtomicU32>,
}

impl FlakyOpener {
    fn new(failures: u32) -> (Self, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (
            Self {
                failures,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl FileOpener for FlakyOpener {
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "file in use"));
        }
        FsOpener.open(path)
    }
}

/// Opener that always fails with a permission error
#[derive(Debug)]
struct DeniedOpener;

impl FileOpener for DeniedOpener {
    fn open(&self, _path: &Path) -> io::Result<Box<dyn Read>> {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"))
    }
}

fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write file");
    path
}

#[test]
fn test_empty_file_digest() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(&temp_dir, "empty.txt", b"");

    // echo -n '' | sha256sum
    assert_eq!(
        HashComputer::default().compute(&path),
        FileDigest::Hash(
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855".to_string()
        )
    );
}

#[test]
fn test_digest_independent_of_chunk_size() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let path = write_file(&temp_dir, "large.dwg", &content);

    let small = HashComputer::default().with_chunk_size(7).compute(&path);
    let large = HashComputer::default().with_chunk_size(1 << 20).compute(&path);

    assert_eq!(small, large);
    assert!(matches!(small, FileDigest::Hash(ref hex) if hex.len() == 64));
}

#[test]
fn test_different_content_different_digest() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let a = write_file(&temp_dir, "a.txt", b"content A");
    let b = write_file(&temp_dir, "b.txt", b"content B");

    let hasher = HashComputer::default();
    assert_ne!(hasher.compute(&a), hasher.compute(&b));
}

#[test]
fn test_missing_file_is_unreadable() {
    let digest = HashComputer::default().compute(Path::new("/nonexistent/path/file.txt"));
    assert_eq!(digest, FileDigest::Unreadable);
    assert_eq!(digest.as_stored(), "");
}

#[test]
fn test_permission_error_is_not_retried() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(&temp_dir, "secret.txt", b"x");

    let hasher = HashComputer::new(RetryPolicy::new(3, 10_000, 2.0)).with_opener(DeniedOpener);
    let started = Instant::now();

    assert_eq!(hasher.compute(&path), FileDigest::Unreadable);
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[test]
fn test_transient_lock_recovers_within_budget() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(&temp_dir, "busy.xlsx", b"sheet");
    let (opener, calls) = FlakyOpener::new(2);

    let digest = HashComputer::new(RetryPolicy::immediate(3))
        .with_opener(opener)
        .compute(&path);

    assert!(matches!(digest, FileDigest::Hash(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_persistent_lock_yields_sentinel() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(&temp_dir, "busy.xlsx", b"sheet");
    let (opener, calls) = FlakyOpener::new(u32::MAX);

    let digest = HashComputer::new(RetryPolicy::immediate(3))
        .with_opener(opener)
        .compute(&path);

    assert_eq!(digest, FileDigest::Locked);
    assert_eq!(digest.as_stored(), LOCKED_SENTINEL);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_lock_retry_waits_between_attempts() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = write_file(&temp_dir, "busy.xlsx", b"sheet");
    let (opener, _calls) = FlakyOpener::new(u32::MAX);

    // 20ms then 40ms, no sleep after the final attempt
    let hasher = HashComputer::new(RetryPolicy::new(3, 20, 2.0)).with_opener(opener);
    let started = Instant::now();
    assert_eq!(hasher.compute(&path), FileDigest::Locked);
    assert!(started.elapsed() >= Duration::from_millis(60));
}

#[test]
fn test_stored_round_trip_of_sentinels() {
    assert_eq!(FileDigest::from_stored(LOCKED_SENTINEL), FileDigest::Locked);
    assert_eq!(FileDigest::from_stored(""), FileDigest::Unreadable);
    assert_eq!(
        FileDigest::from_stored("abc123"),
        FileDigest::Hash("abc123".to_string())
    );
}

#[test]
fn test_lock_error_classification() {
    assert!(is_lock_error(&io::Error::new(io::ErrorKind::WouldBlock, "busy")));
    assert!(!is_lock_error(&io::Error::new(io::ErrorKind::PermissionDenied, "denied")));
    assert!(!is_lock_error(&io::Error::new(io::ErrorKind::NotFound, "gone")));
    #[cfg(windows)]
    assert!(is_lock_error(&io::Error::from_raw_os_error(32)));
    #[cfg(unix)]
    assert!(is_lock_error(&io::Error::from_raw_os_error(16)));
}
