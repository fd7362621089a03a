//! Bounded retry schedules for transient lock conditions

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exponential back-off schedule shared by file hashing and store connections
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    pub attempts: u32,
    /// Delay before the first retry, in milliseconds
    pub initial_delay_ms: u64,
    /// Factor applied to the delay after every failed retry
    pub multiplier: f64,
    /// Upper bound for a single delay, in milliseconds
    pub max_delay_ms: Option<u64>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::hashing()
    }
}

impl RetryPolicy {
    /// Create a policy without a delay cap
    #[must_use]
    pub const fn new(attempts: u32, initial_delay_ms: u64, multiplier: f64) -> Self {
        Self {
            attempts,
            initial_delay_ms,
            multiplier,
            max_delay_ms: None,
        }
    }

    /// Schedule for files held open by another process: 3 tries, 0.5s doubling
    #[must_use]
    pub const fn hashing() -> Self {
        Self::new(3, 500, 2.0)
    }

    /// Schedule for a locked database: 10 tries, 0.5s growing by half, capped at 5s
    #[must_use]
    pub const fn connection() -> Self {
        Self::new(10, 500, 1.5).with_max_delay_ms(5_000)
    }

    /// Retry without sleeping, mostly useful in tests
    #[must_use]
    pub const fn immediate(attempts: u32) -> Self {
        Self::new(attempts, 0, 1.0)
    }

    /// Cap every delay at `max_delay_ms`
    #[must_use]
    pub const fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = Some(max_delay_ms);
        self
    }

    /// Number of attempts, never less than one
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    /// Delay to wait after the failed attempt with zero-based index `retry`
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let mut millis = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        if !millis.is_finite() || millis < 0.0 {
            millis = self.max_delay_ms.unwrap_or(self.initial_delay_ms) as f64;
        }
        if let Some(max) = self.max_delay_ms {
            millis = millis.min(max as f64);
        }
        Duration::try_from_secs_f64(millis / 1_000.0).unwrap_or(Duration::MAX)
    }
}
