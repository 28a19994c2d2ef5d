//! Retry logic for outbound calls with exponential backoff.
//!
//! Chat-facing notifications (new-order alerts, answer delivery) are
//! retried a bounded number of times with backoff and jitter; exhaustion
//! is reported to the caller, never retried forever.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Retry-related errors.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// All retries exhausted
    #[error("Max retries ({max_retries}) exhausted")]
    MaxRetriesExhausted { max_retries: u32, last_error: E },
}

/// Retry strategy configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay before first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays
    pub add_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: crate::core::config::retry::MAX_ATTEMPTS,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry config with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of retries.
    #[must_use]
    pub fn max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Sets the initial delay.
    #[must_use]
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Computes the delay before the given retry attempt (0-based).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let millis = if self.add_jitter {
            // Up to 25% random jitter to avoid thundering herds
            let jitter = rand::thread_rng().gen_range(0.0..0.25);
            capped * (1.0 + jitter)
        } else {
            capped
        };

        Duration::from_millis(millis as u64)
    }
}

/// Runs `operation` with bounded retries and exponential backoff.
///
/// The operation is attempted once plus up to `max_retries` more times.
/// Every failed attempt is logged with `op_name` for traceability.
pub async fn retry_with_backoff<T, E, F, Fut>(
    config: &RetryConfig,
    op_name: &str,
    mut operation: F,
) -> Result<T, RetryError<E>>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt: u32 = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= config.max_retries {
                    log::error!(
                        "{}: giving up after {} attempts: {}",
                        op_name,
                        attempt + 1,
                        err
                    );
                    return Err(RetryError::MaxRetriesExhausted {
                        max_retries: config.max_retries,
                        last_error: err,
                    });
                }

                let delay = config.delay_for_attempt(attempt);
                log::warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {:?}",
                    op_name,
                    attempt + 1,
                    config.max_retries + 1,
                    err,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn succeeds_first_try_without_waiting() {
        let config = RetryConfig::new();
        let result: Result<i32, RetryError<String>> =
            retry_with_backoff(&config, "test", || async { Ok::<_, String>(42) }).await;
        assert_eq!(result.ok(), Some(42));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let config = RetryConfig::new()
            .max_retries(3)
            .initial_delay(Duration::from_millis(1));
        let calls = AtomicU32::new(0);

        let result = retry_with_backoff(&config, "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("transient".to_string())
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.ok(), Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_reports_last_error() {
        let config = RetryConfig::new()
            .max_retries(1)
            .initial_delay(Duration::from_millis(1));

        let result: Result<(), _> =
            retry_with_backoff(&config, "test", || async { Err("down".to_string()) }).await;

        match result {
            Err(RetryError::MaxRetriesExhausted { max_retries, last_error }) => {
                assert_eq!(max_retries, 1);
                assert_eq!(last_error, "down");
            }
            Ok(()) => panic!("expected exhaustion"),
        }
    }
}
