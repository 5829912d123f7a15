//! Bounded retry with a fixed delay and random jitter.

use crate::error::Result;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

const DEFAULT_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(500);

/// How often and how patiently an operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    base_delay: Duration,
    max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_BASE_DELAY, DEFAULT_MAX_JITTER)
    }
}

impl RetryPolicy {
    /// Create a policy. At least one attempt is always made.
    pub const fn new(attempts: u32, base_delay: Duration, max_jitter: Duration) -> Self {
        Self {
            attempts: if attempts == 0 { 1 } else { attempts },
            base_delay,
            max_jitter,
        }
    }

    /// Total number of attempts, including the first one.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    fn next_delay(&self) -> Duration {
        let jitter_ms = self.max_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return self.base_delay;
        }
        self.base_delay + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }

    /// Run `operation` until it succeeds, fails permanently, or runs out of
    /// attempts. Every failed attempt is logged; the last error is returned.
    pub async fn run<T, F, Fut>(&self, description: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            tracing::error!(attempt, max_attempts = self.attempts, "{}", err);

            if !err.is_retryable() {
                tracing::error!("{} failed with a permanent error", description);
                return Err(err);
            }
            if attempt >= self.attempts {
                tracing::error!("{} failed after {} attempts", description, self.attempts);
                return Err(err);
            }

            tokio::time::sleep(self.next_delay()).await;
            attempt += 1;
        }
    }
}
