//! Review module: Read-only listings of changes, files, projects and scans

mod run;

pub use run::{ReviewQuery, format_timestamp, run, truncate_path, truncate_str};
