//! Retry with exponential backoff for throttled API calls
//!
//! Only errors classified by [`Error::is_rate_limited`] are retried.
//! Everything else is returned on the first failure.

use crate::error::{Error, Result};
use crate::observability::DiscoveryMetrics;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry limits and backoff shape
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts is `max_retries + 1`
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay to wait after the failed attempt numbered `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        next_delay(attempt, self.base_delay, self.backoff_factor)
    }
}

/// Backoff delay before retry number `attempt + 1`: `base * factor^attempt`.
///
/// Saturates at `Duration::MAX`; a zero base, or a negative or NaN scale,
/// yields `base`.
pub fn next_delay(attempt: u32, base: Duration, factor: f64) -> Duration {
    let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
    let scale = factor.powi(exponent);
    if base.is_zero() || scale.is_nan() || scale < 0.0 {
        return base;
    }
    Duration::try_from_secs_f64(base.as_secs_f64() * scale).unwrap_or(Duration::MAX)
}

/// Run `operation`, retrying rate-limited failures per `policy`.
///
/// After `max_retries` retries the last error is returned.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if should_retry(&err, attempt, policy) => {
                let delay = policy.delay_for(attempt);
                warn!(
                    operation = %label,
                    attempt = attempt + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Rate limited, backing off"
                );
                DiscoveryMetrics::new().inc_retries();
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

fn should_retry(err: &Error, attempt: u32, policy: &RetryPolicy) -> bool {
    err.is_rate_limited() && attempt < policy.max_retries
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            backoff_factor: 2.0,
        }
    }

    #[test]
    fn test_next_delay() {
        let base = Duration::from_secs(1);
        assert_eq!(next_delay(0, base, 2.0), Duration::from_secs(1));
        assert_eq!(next_delay(1, base, 2.0), Duration::from_secs(2));
        assert_eq!(next_delay(3, base, 2.0), Duration::from_secs(8));
        assert_eq!(next_delay(2, Duration::from_millis(100), 1.5), Duration::from_millis(225));
        assert_eq!(next_delay(4, base, 1.0), base);
    }

    #[test]
    fn test_next_delay_saturates() {
        let base = Duration::from_secs(1);
        assert_eq!(next_delay(25, base, 10.0), Duration::MAX);
        assert_eq!(next_delay(u32::MAX, base, 2.0), Duration::MAX);
        assert_eq!(next_delay(3, Duration::ZERO, 1e300), Duration::ZERO);
        assert_eq!(next_delay(1, base, -2.0), base);
    }

    #[tokio::test]
    async fn test_rate_limited_retries_until_cap() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = with_retry(&fast_policy(2), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::api(Some(429), "Too many requests")) }
        })
        .await;

        assert!(result.unwrap_err().is_rate_limited());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_other_errors_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = with_retry(&fast_policy(2), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::api(Some(500), "Internal server error")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_recovers_after_throttling() {
        let calls = AtomicUsize::new(0);
        let result = with_retry(&fast_policy(3), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::api(None, "rate limit exceeded"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_disabled_policy_single_attempt() {
        let calls = AtomicUsize::new(0);
        let result: Result<()> = with_retry(&RetryPolicy::disabled(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::api(Some(429), "slow down")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
