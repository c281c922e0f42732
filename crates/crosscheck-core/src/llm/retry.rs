//! Bounded retry for rate-limited gateway calls.
//!
//! Only `ErrorKind::RateLimited` is retried. Auth, not-found and transport
//! failures return immediately since another attempt cannot succeed and only
//! burns quota.

use std::future::Future;
use std::time::Duration;

use crosscheck_types::config::{BackoffKind, RetryConfig};
use crosscheck_types::llm::GatewayError;

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// How many times to call and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first call. Zero is treated as one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: BackoffKind,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, backoff: BackoffKind) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff,
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, BackoffKind::Fixed)
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
            config.backoff,
        )
    }

    /// Effective number of attempts (at least one).
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to sleep after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            BackoffKind::Fixed => self.base_delay,
            BackoffKind::Linear => self.base_delay.saturating_mul(attempt.max(1)),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

/// Emitted before every backoff sleep.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryNotice {
    /// The attempt that just failed (1-based).
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
    pub error: GatewayError,
}

// ---------------------------------------------------------------------------
// with_retry
// ---------------------------------------------------------------------------

/// Call `call` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up. Returns the last error on exhaustion.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, call: F) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
{
    with_retry_notify(policy, call, |_| {}).await
}

/// Like [`with_retry`], invoking `on_retry` before each backoff sleep.
pub async fn with_retry_notify<T, F, Fut, N>(
    policy: &RetryPolicy,
    mut call: F,
    mut on_retry: N,
) -> Result<T, GatewayError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, GatewayError>>,
    N: FnMut(&RetryNotice),
{
    let max_attempts = policy.attempts();
    let mut attempt = 1;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < max_attempts => {
                let delay = policy.delay_for(attempt);
                if let GatewayError::RateLimited {
                    retry_after_ms: Some(hint),
                    ..
                } = &error
                {
                    tracing::debug!(retry_after_ms = hint, "provider sent a retry hint");
                }
                tracing::warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "rate limited, backing off"
                );
                on_retry(&RetryNotice {
                    attempt,
                    max_attempts,
                    delay,
                    error,
                });
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32, backoff: BackoffKind) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::from_secs(2), backoff)
    }

    #[test]
    fn test_delay_for_fixed_and_linear() {
        let fixed = policy(3, BackoffKind::Fixed);
        assert_eq!(fixed.delay_for(1), Duration::from_secs(2));
        assert_eq!(fixed.delay_for(3), Duration::from_secs(2));

        let linear = policy(3, BackoffKind::Linear);
        assert_eq!(linear.delay_for(1), Duration::from_secs(2));
        assert_eq!(linear.delay_for(2), Duration::from_secs(4));
        assert_eq!(linear.delay_for(3), Duration::from_secs(6));
    }

    #[test]
    fn test_zero_attempts_treated_as_one() {
        assert_eq!(policy(0, BackoffKind::Fixed).attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_rate_limited_calls_exactly_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<String, _> = with_retry(&policy(3, BackoffKind::Linear), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(GatewayError::rate_limited("quota exceeded")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(GatewayError::RateLimited { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error_called_once() {
        let calls = AtomicU32::new(0);
        let result: Result<String, _> = with_retry(&policy(3, BackoffKind::Fixed), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(GatewayError::AuthenticationFailed("bad key".into())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            result,
            Err(GatewayError::AuthenticationFailed("bad key".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_rate_limit() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&policy(3, BackoffKind::Fixed), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(GatewayError::rate_limited("429"))
                } else {
                    Ok("4".to_string())
                }
            }
        })
        .await;

        assert_eq!(result, Ok("4".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_linear_backoff_sleeps_grow() {
        let start = tokio::time::Instant::now();
        let mut notices = Vec::new();
        let _: Result<String, _> = with_retry_notify(
            &policy(3, BackoffKind::Linear),
            || async { Err(GatewayError::rate_limited("429")) },
            |notice| notices.push((notice.attempt, notice.delay)),
        )
        .await;

        assert_eq!(
            notices,
            vec![(1, Duration::from_secs(2)), (2, Duration::from_secs(4))]
        );
        assert!(start.elapsed() >= Duration::from_secs(6));
    }
}
