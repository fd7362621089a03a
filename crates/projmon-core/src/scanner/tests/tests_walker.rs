//! Tests for the directory walker

#![allow(clippy::expect_used)]

use std::fs;
use std::time::{Duration, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use filetime::FileTime;
use tempfile::TempDir;

use crate::retry::RetryPolicy;
use crate::scanner::{DirectoryScanner, FileDigest, HashComputer, normalize_created};

fn scanner_for(dir: &TempDir) -> DirectoryScanner {
    DirectoryScanner::new(dir.path(), HashComputer::new(RetryPolicy::immediate(1)))
}

#[test]
fn test_scanner_finds_nested_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let sub = temp_dir.path().join("Drawings").join("Rev A");
    fs::create_dir_all(&sub).expect("Failed to create dirs");

    fs::write(temp_dir.path().join("a.txt"), "a").expect("Failed to write file");
    fs::write(sub.join("layout.dwg"), "dwg").expect("Failed to write file");

    let snapshot = scanner_for(&temp_dir).scan();

    let paths: Vec<_> = snapshot.files.keys().cloned().collect();
    assert_eq!(paths, vec!["Drawings/Rev A/layout.dwg", "a.txt"]);
    assert_eq!(snapshot.files_scanned(), 2);

    let layout = &snapshot.files["Drawings/Rev A/layout.dwg"];
    assert_eq!(layout.file_name, "layout.dwg");
    assert_eq!(layout.extension, ".dwg");
    assert_eq!(layout.parent_path, "Drawings/Rev A");
    assert_eq!(layout.size, 3);

    let root_file = &snapshot.files["a.txt"];
    assert_eq!(root_file.parent_path, "");
    assert_eq!(root_file.extension, ".txt");
}

#[test]
fn test_scanner_skips_editor_artifacts() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    for name in ["keep.pdf", "old.bak", "scratch.tmp", "~$sheet.xlsx", ".~lock.x#", "a~b.doc"] {
        fs::write(temp_dir.path().join(name), name).expect("Failed to write file");
    }

    let snapshot = scanner_for(&temp_dir).scan();

    assert_eq!(snapshot.files.keys().collect::<Vec<_>>(), vec!["keep.pdf"]);
    assert_eq!(snapshot.files_scanned(), 1);
}

#[test]
fn test_scanner_includes_hidden_and_gitignored_files() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join(".gitignore"), "*.log\n").expect("Failed to write file");
    fs::write(temp_dir.path().join("plot.log"), "log").expect("Failed to write file");

    let snapshot = scanner_for(&temp_dir).scan();

    assert!(snapshot.contains(".gitignore"));
    assert!(snapshot.contains("plot.log"));
}

#[test]
fn test_scanner_file_without_extension() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(temp_dir.path().join("README"), "x").expect("Failed to write file");

    let snapshot = scanner_for(&temp_dir).scan();
    assert_eq!(snapshot.files["README"].extension, "");
}

#[test]
fn test_scanner_records_mtime_and_digest() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("a.txt");
    fs::write(&path, "hello").expect("Failed to write file");
    filetime::set_file_mtime(&path, FileTime::from_unix_time(1_700_000_000, 0))
        .expect("Failed to set mtime");

    let snapshot = scanner_for(&temp_dir).scan();
    let file = &snapshot.files["a.txt"];

    assert_eq!(file.modified.timestamp(), 1_700_000_000);
    assert!(matches!(file.digest, FileDigest::Hash(_)));
}

#[test]
fn test_created_never_after_modified_on_disk() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("old.pdf");
    fs::write(&path, "pdf").expect("Failed to write file");
    // mtime far in the past, ctime is "now"
    filetime::set_file_mtime(&path, FileTime::from_unix_time(946_684_800, 0))
        .expect("Failed to set mtime");

    let snapshot = scanner_for(&temp_dir).scan();
    let file = &snapshot.files["old.pdf"];

    assert!(file.created <= file.modified);
}

#[test]
fn test_normalize_created_clamps_to_modified() {
    let modified = UNIX_EPOCH + Duration::from_secs(1_000);
    let later_change = UNIX_EPOCH + Duration::from_secs(5_000);
    let earlier_change = UNIX_EPOCH + Duration::from_secs(10);

    assert_eq!(
        normalize_created(Some(later_change), modified),
        DateTime::<Utc>::from(modified)
    );
    assert_eq!(
        normalize_created(Some(earlier_change), modified),
        DateTime::<Utc>::from(earlier_change)
    );
    assert_eq!(normalize_created(None, modified), DateTime::<Utc>::from(modified));
}

#[test]
fn test_missing_root_yields_empty_snapshot() {
    let scanner = DirectoryScanner::new(
        "/nonexistent/project/root",
        HashComputer::new(RetryPolicy::immediate(1)),
    );
    let snapshot = scanner.scan();
    assert_eq!(snapshot.files_scanned(), 0);
}

#[cfg(unix)]
#[test]
fn test_scanner_tracks_file_links_but_not_directory_links() {
    use std::os::unix::fs::symlink;

    let outside = TempDir::new().expect("Failed to create temp dir");
    fs::write(outside.path().join("outside.pdf"), "shared data").expect("Failed to write file");
    fs::create_dir_all(outside.path().join("library")).expect("Failed to create dir");
    fs::write(outside.path().join("library/part.dwg"), "part").expect("Failed to write file");

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    symlink(outside.path().join("outside.pdf"), temp_dir.path().join("link.pdf"))
        .expect("Failed to link file");
    symlink(outside.path().join("library"), temp_dir.path().join("library"))
        .expect("Failed to link dir");
    symlink(temp_dir.path().join("gone.pdf"), temp_dir.path().join("dangling.pdf"))
        .expect("Failed to link missing file");

    let snapshot = scanner_for(&temp_dir).scan();

    assert_eq!(snapshot.files.keys().collect::<Vec<_>>(), vec!["link.pdf"]);
    assert_eq!(snapshot.files["link.pdf"].size, 11);
    assert!(matches!(snapshot.files["link.pdf"].digest, FileDigest::Hash(_)));
}
