//! Exponential backoff for source fetches.
//!
//! Only errors whose code is retryable (network failures) are retried;
//! a malformed document fails on the first attempt.

use crate::error::DictionaryError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// How many times a fetch is attempted and how long to wait in between
#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::network()
    }
}

impl RetryConfig {
    /// Configuration for remote fetches
    pub fn network() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(15),
            backoff_multiplier: 2.5,
            jitter: true,
        }
    }

    /// A single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::network()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

/// Decides whether a failed attempt is tried again, and after how long
pub trait RetryPolicy: Send + Sync {
    fn should_retry(&self, attempt: u32, error: &DictionaryError) -> bool;
    fn delay(&self, attempt: u32) -> Duration;
}

/// Delay of `initial_delay * multiplier^(attempt - 1)`, capped at
/// `max_delay`, plus up to a quarter more when jitter is on
#[derive(Debug, Clone, Default)]
pub struct ExponentialBackoff {
    config: RetryConfig,
}

impl ExponentialBackoff {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }
}

impl RetryPolicy for ExponentialBackoff {
    fn should_retry(&self, attempt: u32, error: &DictionaryError) -> bool {
        attempt < self.config.max_attempts && error.code().is_retryable()
    }

    fn delay(&self, attempt: u32) -> Duration {
        let RetryConfig {
            initial_delay,
            max_delay,
            backoff_multiplier,
            jitter,
            ..
        } = self.config;
        let factor = backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let millis = (initial_delay.as_millis() as f64 * factor).min(max_delay.as_millis() as f64);
        let spread = if jitter {
            millis * 0.25 * rand::random::<f64>()
        } else {
            0.0
        };
        Duration::from_millis((millis + spread) as u64)
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy runs out of attempts. The last error is returned.
pub async fn retry_async_with_policy<T, F, Fut>(
    mut operation: F,
    policy: &dyn RetryPolicy,
    operation_name: &str,
) -> Result<T, DictionaryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DictionaryError>>,
{
    let mut attempt = 1;
    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(operation = operation_name, attempt, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };
        if !policy.should_retry(attempt, &err) {
            return Err(err);
        }
        let delay = policy.delay(attempt);
        warn!(
            operation = operation_name,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "attempt failed, retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn no_jitter(max_attempts: u32) -> ExponentialBackoff {
        ExponentialBackoff::new(RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(1_000),
            backoff_multiplier: 2.0,
            jitter: false,
        })
    }

    #[test]
    fn delay_grows_and_is_capped() {
        let policy = no_jitter(5);
        assert_eq!(policy.delay(1), Duration::from_millis(100));
        assert_eq!(policy.delay(2), Duration::from_millis(200));
        assert_eq!(policy.delay(3), Duration::from_millis(400));
        assert_eq!(policy.delay(10), Duration::from_millis(1_000));
    }

    #[test]
    fn only_retryable_errors_are_retried() {
        let policy = no_jitter(3);
        let fetch = DictionaryError::fetch_failed("http://x", "timeout");
        let missing = DictionaryError::entity_not_found("x");
        assert!(policy.should_retry(1, &fetch));
        assert!(!policy.should_retry(3, &fetch));
        assert!(!policy.should_retry(1, &missing));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = retry_async_with_policy(
            move || async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(DictionaryError::fetch_failed("http://x", "connection reset"))
                } else {
                    Ok(42)
                }
            },
            &no_jitter(3),
            "test_fetch",
        )
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = retry_async_with_policy(
            move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(DictionaryError::fetch_failed("http://x", "unavailable"))
            },
            &no_jitter(2),
            "test_fetch",
        )
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
