//! Scanner module: Directory walking and content hashing
//!
//! Responsible for walking a project root, skipping editor lock and scratch
//! files, and describing every remaining file with its timestamps and a
//! lock-tolerant content digest. Never touches the store.

mod filter;
mod hash;
mod walker;

pub use filter::is_ignored_name;
pub use hash::{
    FileDigest, FileOpener, FsOpener, HashComputer, LOCKED_SENTINEL, is_lock_error,
};
pub use walker::{DirectoryScanner, FileMetadata, Snapshot, normalize_created};

#[cfg(test)]
mod tests;
