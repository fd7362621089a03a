//! Tests for store model types

#![allow(clippy::expect_used)]

use chrono::{TimeZone, Timelike, Utc};
use rstest::rstest;

use crate::store::model::{ChangeType, DedupReport, parse_iso, to_iso};

#[rstest]
#[case("new", ChangeType::New)]
#[case("updated", ChangeType::Updated)]
#[case("Deleted", ChangeType::Deleted)]
fn test_change_type_parse(#[case] input: &str, #[case] expected: ChangeType) {
    assert_eq!(input.parse::<ChangeType>(), Ok(expected));
}

#[test]
fn test_change_type_rejects_unknown() {
    assert!("renamed".parse::<ChangeType>().is_err());
}

#[test]
fn test_change_type_display_matches_stored_value() {
    for kind in [ChangeType::New, ChangeType::Updated, ChangeType::Deleted] {
        assert_eq!(kind.to_string(), kind.as_str());
    }
}

#[test]
fn test_iso_round_trip_keeps_micros() {
    let ts = Utc
        .with_ymd_and_hms(2024, 3, 5, 14, 30, 15)
        .single()
        .and_then(|t| t.with_nanosecond(123_456_000))
        .expect("valid timestamp");

    assert_eq!(parse_iso(&to_iso(ts)), Some(ts));
}

#[test]
fn test_parse_iso_accepts_naive_local() {
    assert!(parse_iso("2024-03-05T14:30:15.250000").is_some());
    assert!(parse_iso("2024-03-05 14:30:15").is_some());
}

#[test]
fn test_parse_iso_rejects_garbage() {
    assert_eq!(parse_iso("yesterday"), None);
    assert_eq!(parse_iso(""), None);
}

#[test]
fn test_dedup_report_total() {
    let report = DedupReport {
        duplicate_changes: 3,
        duplicate_deletions: 2,
    };
    assert_eq!(report.total(), 5);
}
