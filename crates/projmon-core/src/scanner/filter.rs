//! Editor artifact filter

/// Returns true for names that are editor lock or scratch artifacts
///
/// Matches `*.bak`, `*.tmp`, names starting with `~` and anything containing
/// `~` (which covers the `.~lock` style). Extension checks ignore ASCII case,
/// mirroring the SQL `LIKE` filters used by the ledger queries.
#[must_use]
pub fn is_ignored_name(name: &str) -> bool {
    if name.contains('~') {
        return true;
    }
    let lower = name.to_ascii_lowercase();
    lower.ends_with(".bak") || lower.ends_with(".tmp")
}
