//! projmon-cli library
//!
//! This module exposes the internal functionality of projmon-cli for testing purposes.

// Make commands module available for internal tests only
#[doc(hidden)]
pub mod commands;

pub mod logging;
pub mod types;
pub use types::{Commands, OutputFormat};

#[cfg(test)]
mod tests;
