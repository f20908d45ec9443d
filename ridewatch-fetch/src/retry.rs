//! Retry policy shared by session renewal and slot fetching.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

use crate::error::ApiError;

/// Bounded retry policy with optional exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay between attempts in milliseconds.
    pub base_delay_ms: u64,
    /// Whether to use exponential backoff.
    pub exponential_backoff: bool,
    /// Maximum delay between attempts in milliseconds.
    pub max_delay_ms: u64,
}

/// The last error after a policy gave up.
#[derive(Debug, Clone)]
pub struct Exhausted {
    /// Attempts made.
    pub attempts: u32,
    /// Error of the final attempt.
    pub error: ApiError,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms: 1_000,
            exponential_backoff: true,
            max_delay_ms: 60_000,
        }
    }

    /// Disables retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            exponential_backoff: false,
            max_delay_ms: 0,
        }
    }

    /// Sets the base delay.
    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Enables or disables exponential backoff.
    pub fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential_backoff = enabled;
        self
    }

    /// Calculates the delay after a failed attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = if self.exponential_backoff {
            let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
            self.base_delay_ms.saturating_mul(factor)
        } else {
            self.base_delay_ms
        };

        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Runs `op` until it succeeds, fails with an error `retry_if` rejects,
    /// or `max_attempts` is reached.
    ///
    /// `op` receives the 1-based attempt number. A rate-limit error carrying
    /// a retry-after hint waits at least that long before the next attempt.
    pub async fn execute<T, F, Fut, R>(&self, label: &str, mut op: F, retry_if: R) -> Result<T, Exhausted>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
        R: Fn(&ApiError) -> bool,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if attempt >= max_attempts || !retry_if(&error) {
                        return Err(Exhausted {
                            attempts: attempt,
                            error,
                        });
                    }

                    let mut delay = self.delay_for_attempt(attempt);
                    if let ApiError::RateLimited {
                        retry_after: Some(secs),
                    } = &error
                    {
                        delay = delay.max(Duration::from_secs(*secs));
                    }

                    warn!(
                        op = label,
                        attempt,
                        max_attempts,
                        error = %error,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_backoff() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(8));
    }

    #[test]
    fn test_max_delay_cap() {
        let policy = RetryPolicy::new(10).with_base_delay(Duration::from_secs(10));

        // Should be capped at 60 seconds
        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(60));
    }

    #[test]
    fn test_fixed_delay() {
        let policy = RetryPolicy::new(5).with_exponential_backoff(false);
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_stops_at_bound() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3);

        let result: Result<(), _> = policy
            .execute(
                "test",
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(ApiError::Transient("502".into())) }
                },
                ApiError::is_transient,
            )
            .await;

        let exhausted = result.unwrap_err();
        assert_eq!(exhausted.attempts, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_does_not_retry_rejected_errors() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = RetryPolicy::new(5)
            .execute(
                "test",
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(ApiError::Malformed("bad json".into())) }
                },
                ApiError::is_transient,
            )
            .await;

        assert_eq!(result.unwrap_err().attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_recovers() {
        let result = RetryPolicy::new(3)
            .execute(
                "test",
                |attempt| async move {
                    if attempt < 2 {
                        Err(ApiError::Transient("reset".into()))
                    } else {
                        Ok(attempt)
                    }
                },
                ApiError::is_transient,
            )
            .await;

        assert_eq!(result.unwrap(), 2);
    }
}
