//! Bounded retry with exponential backoff for idempotent reads.
//!
//! Only history, by-id and model-status lookups go through here. Predictions and auth calls are
//! never retried.

use crate::GlycoResult;
use std::future::Future;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    base_backoff: Duration,
}

impl RetryPolicy {
    /// `attempts` counts the first try; values below 1 are raised to 1.
    pub fn new(attempts: u32, base_backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            base_backoff,
        }
    }

    /// A policy that tries once.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay before retry number `retry` (1-based): `base * 2^(retry - 1)`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor)
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the policy is exhausted.
pub async fn retry_idempotent<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> GlycoResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GlycoResult<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.attempts => {
                let delay = policy.backoff(attempt);
                tracing::warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    operation,
                    attempt,
                    policy.attempts,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GlycoError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_unavailable_until_success() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(50));

        let value = retry_idempotent(&policy, "history", || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(GlycoError::GatewayUnavailable("connection refused".into()))
            } else {
                Ok(7)
            }
        })
        .await
        .expect("third attempt succeeds");

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_policy_attempts() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::from_millis(50));

        let err = retry_idempotent(&policy, "models", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(GlycoError::GatewayTimeout(Duration::from_secs(1)))
        })
        .await
        .expect_err("exhausted");

        assert!(matches!(err, GlycoError::GatewayTimeout(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_non_retryable_errors() {
        let calls = &AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::from_millis(50));

        let err = retry_idempotent(&policy, "by-id", || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(GlycoError::Authentication("expired".into()))
        })
        .await
        .expect_err("auth errors surface immediately");

        assert!(matches!(err, GlycoError::Authentication(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
