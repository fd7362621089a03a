//! Human-readable change descriptions for the change log

use std::fmt;

const KIB: f64 = 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

/// What was observed about a change, rendered for the log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeDetail {
    Updated {
        content_changed: bool,
        time_changed: bool,
    },
    New {
        size: u64,
    },
    Deleted,
}

impl fmt::Display for ChangeDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Updated {
                content_changed: true,
                time_changed: true,
            } => f.write_str("Content changed & File modified"),
            Self::Updated {
                content_changed: true,
                time_changed: false,
            } => f.write_str("Content changed (same time)"),
            Self::Updated {
                content_changed: false,
                time_changed: true,
            } => f.write_str("File modified (same content)"),
            Self::Updated { .. } => f.write_str("File updated"),
            Self::New { size } => {
                #[allow(clippy::cast_precision_loss)]
                let bytes = size as f64;
                if bytes >= MIB {
                    write!(f, "New file ({:.1} MB)", bytes / MIB)
                } else {
                    write!(f, "New file ({:.1} KB)", bytes / KIB)
                }
            }
            Self::Deleted => f.write_str("File removed from project"),
        }
    }
}
