//! CLI commands

pub mod ack;
pub mod context;
pub mod maintain;
pub mod review;
pub mod scan;
pub mod watch;

pub use context::open_service;
