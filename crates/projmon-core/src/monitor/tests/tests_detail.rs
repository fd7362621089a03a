//! Tests for change log descriptions

use rstest::rstest;

use crate::monitor::ChangeDetail;

#[rstest]
#[case(true, true, "Content changed & File modified")]
#[case(true, false, "Content changed (same time)")]
#[case(false, true, "File modified (same content)")]
#[case(false, false, "File updated")]
fn test_updated_detail(
    #[case] content_changed: bool,
    #[case] time_changed: bool,
    #[case] expected: &str,
) {
    let detail = ChangeDetail::Updated {
        content_changed,
        time_changed,
    };
    assert_eq!(detail.to_string(), expected);
}

#[rstest]
#[case(0, "New file (0.0 KB)")]
#[case(1536, "New file (1.5 KB)")]
#[case(1024 * 1024 - 1, "New file (1024.0 KB)")]
#[case(1024 * 1024, "New file (1.0 MB)")]
#[case(5 * 1024 * 1024 + 512 * 1024, "New file (5.5 MB)")]
fn test_new_file_size(#[case] size: u64, #[case] expected: &str) {
    assert_eq!(ChangeDetail::New { size }.to_string(), expected);
}

#[test]
fn test_deleted_detail() {
    assert_eq!(ChangeDetail::Deleted.to_string(), "File removed from project");
}
