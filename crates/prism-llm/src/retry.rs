//! Bounded exponential backoff with full jitter
//!
//! Applied to provider invocations only. Conversion and routing errors are
//! terminal; streaming retries cover stream establishment, never mid-stream
//! failures.

use std::future::Future;
use std::time::Duration;

use prism_config::RetryConfig;
use rand::Rng;

use crate::error::GatewayError;

/// Retry policy for provider calls
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    wait_min: Duration,
    wait_max: Duration,
}

impl RetryPolicy {
    pub fn new(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            wait_min: Duration::from_secs(config.wait_min_seconds),
            wait_max: Duration::from_secs(config.wait_max_seconds),
        }
    }

    /// Run `op` until it succeeds, fails terminally, or attempts run out
    ///
    /// `op` receives the zero-based attempt number.
    pub async fn run<T, F, Fut>(&self, label: &str, op: F) -> Result<T, GatewayError>
    where
        F: Fn(u32) -> Fut,
        Fut: Future<Output = Result<T, GatewayError>>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && attempt + 1 < self.max_attempts => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        target = label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient provider error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Full-jitter delay: uniform over `[0, min(wait_max, wait_min * 2^attempt)]`
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = self.wait_min.saturating_mul(2u32.saturating_pow(attempt));
        let ceiling = exp.min(self.wait_max);
        if ceiling.is_zero() {
            return Duration::ZERO;
        }
        let millis = rand::thread_rng().gen_range(0..=ceiling.as_millis() as u64);
        Duration::from_millis(millis)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(&RetryConfig {
            max_attempts,
            wait_min_seconds: 0,
            wait_max_seconds: 0,
            provider_timeout_secs: 1,
        })
    }

    #[tokio::test]
    async fn non_retryable_errors_get_zero_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy(3)
            .run("test", |_| {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Err(GatewayError::Validation("bad".into())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn transient_errors_retry_up_to_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = policy(3)
            .run("test", |_| {
                calls.fetch_add(1, Ordering::Relaxed);
                async { Err(GatewayError::ServiceUnavailable("503".into())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn success_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = policy(3)
            .run("test", |attempt| {
                calls.fetch_add(1, Ordering::Relaxed);
                async move {
                    if attempt == 0 {
                        Err(GatewayError::Transport("reset".into()))
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 1);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn backoff_stays_within_ceiling() {
        let policy = RetryPolicy::new(&RetryConfig {
            max_attempts: 5,
            wait_min_seconds: 1,
            wait_max_seconds: 10,
            provider_timeout_secs: 1,
        });
        for attempt in 0..10 {
            assert!(policy.backoff_delay(attempt) <= Duration::from_secs(10));
        }
    }
}
