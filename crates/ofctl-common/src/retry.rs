//! Bounded retry for session operations.

use crate::error::SessionError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// How often and how patiently to repeat a failing session request.
///
/// Only errors for which [`SessionError::is_retryable`] holds are
/// repeated; everything else fails on the first attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,
    /// Pause between attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// A policy that never repeats a request.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Runs `op` until it succeeds, fails permanently, or attempts run out.
    ///
    /// On failure returns the last error together with the number of
    /// attempts made.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, (SessionError, u32)>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SessionError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    debug!(attempt, max_attempts, error = %e, "Retrying session request");
                    if !self.backoff.is_zero() {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
                Err(e) => return Err((e, attempt)),
            }
        }
    }
}
