//! Execution Timeout Management
//!
//! This module provides the wall-clock deadline applied to every command.

use std::future::Future;
use std::time::Duration;
use tokio::time;

/// Default deadline for a single command
pub const DEFAULT_TIMEOUT_SECS: u64 = 8;

/// The deadline expired before the future completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("deadline of {0:?} elapsed")]
pub struct Elapsed(pub Duration);

/// Execution timeout configuration
///
/// Timeouts are enforced by the executor itself, not cooperatively by the
/// spawned program.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionTimeout {
    /// The timeout duration
    duration: Duration,
}

impl Default for ExecutionTimeout {
    fn default() -> Self {
        Self::from_secs(DEFAULT_TIMEOUT_SECS)
    }
}

impl ExecutionTimeout {
    /// Create a new execution timeout
    ///
    /// # Example
    ///
    /// ```
    /// use std::time::Duration;
    /// use safeterm::tools::ExecutionTimeout;
    ///
    /// let timeout = ExecutionTimeout::new(Duration::from_secs(3));
    /// assert_eq!(timeout.duration(), Duration::from_secs(3));
    /// ```
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    /// Create a timeout from seconds
    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// Get the timeout duration
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Drive a future to completion or until the deadline expires
    ///
    /// The future is dropped on expiry; callers that own a child process
    /// must still kill it.
    pub async fn run<F, T>(&self, future: F) -> Result<T, Elapsed>
    where
        F: Future<Output = T>,
    {
        time::timeout(self.duration, future)
            .await
            .map_err(|_| Elapsed(self.duration))
    }
}

impl From<Duration> for ExecutionTimeout {
    fn from(duration: Duration) -> Self {
        Self::new(duration)
    }
}
