//! Tests for the projmon binary
//!
//! These run the built executable end to end against a temporary database.

#![allow(clippy::expect_used)]

use std::fs;
use std::process::Command;

use tempfile::TempDir;

fn projmon() -> Command {
    Command::new(env!("CARGO_BIN_EXE_projmon"))
}

#[test]
fn test_help_lists_commands() {
    let output = projmon().arg("--help").output().expect("Failed to run projmon");
    let text = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for command in ["scan", "watch", "changes", "files", "ack", "projects", "history", "maintain", "stats"] {
        assert!(text.contains(command), "help should mention {command}");
    }
}

#[test]
fn test_unknown_change_type_is_rejected() {
    let output = projmon()
        .args(["ack", "J1", "a.txt", "--type", "renamed"])
        .output()
        .expect("Failed to run projmon");

    assert!(!output.status.success());
}

#[test]
fn test_stats_on_fresh_database_as_json() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db = dir.path().join("fresh.db");

    let output = projmon()
        .current_dir(dir.path())
        .arg("--db")
        .arg(&db)
        .args(["--format", "json", "stats"])
        .output()
        .expect("Failed to run projmon");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stats: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("stats output should be JSON");
    assert_eq!(stats["total_files"], 0);
    assert!(db.exists());
}

#[test]
fn test_scan_unknown_job_is_skipped() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    fs::write(dir.path().join("projmon.toml"), "").expect("Failed to write config");

    let output = projmon()
        .current_dir(dir.path())
        .arg("--db")
        .arg(dir.path().join("m.db"))
        .args(["scan", "J404"])
        .output()
        .expect("Failed to run projmon");

    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("Skipped J404"));
}
