use std::future::Future;
use std::time::Duration;

use crate::error::{AppError, ErrorRetryStrategy, Result};

/// Bounded retry with exponential backoff and a deadline per attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or runs out of attempts.
///
/// Only errors whose [`AppError::retry_strategy`] is `Retry` are tried
/// again; an attempt that exceeds the deadline becomes
/// [`AppError::Timeout`], which is retryable.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, operation: &'static str, op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry_when(policy, operation, |err| err.retry_strategy(), op).await
}

/// Like [`with_retry`], with the caller deciding which errors are worth
/// another attempt.
pub async fn with_retry_when<T, F, Fut, S>(
    policy: &RetryPolicy,
    operation: &'static str,
    strategy: S,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    S: Fn(&AppError) -> ErrorRetryStrategy,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut backoff = policy.initial_backoff;
    let mut attempt = 1;

    loop {
        let outcome = match tokio::time::timeout(policy.attempt_timeout, op()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::Timeout {
                operation,
                after: policy.attempt_timeout,
            }),
        };

        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if attempt >= max_attempts || strategy(&err) == ErrorRetryStrategy::Fail {
            return Err(err);
        }

        tracing::warn!(
            "{} failed (attempt {}/{}), retrying in {:?}: {}",
            operation,
            attempt,
            max_attempts,
            backoff,
            err
        );
        tokio::time::sleep(backoff).await;
        backoff = backoff.saturating_mul(2);
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(1),
            attempt_timeout: Duration::from_secs(5),
        }
    }

    fn transient() -> AppError {
        AppError::ClaudeApi {
            status: 503,
            message: "overloaded".into(),
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(&fast(3), "test op", move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(transient())
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_retry(&fast(3), "test op", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(transient())
        })
        .await;

        assert!(matches!(result, Err(AppError::ClaudeApi { status: 503, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_retry(&fast(5), "test op", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::DuplicateFact {
                day: 1,
                month: 1,
                year: 2025,
            })
        })
        .await;

        assert!(matches!(result, Err(AppError::DuplicateFact { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempts_time_out() {
        let policy = RetryPolicy {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(10),
            attempt_timeout: Duration::from_secs(1),
        };
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_retry(&policy, "slow op", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        assert!(matches!(
            result,
            Err(AppError::Timeout {
                operation: "slow op",
                ..
            })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_attempts_still_runs_once() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry(&fast(0), "test op", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, AppError>("done")
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn custom_strategy_can_refuse_timeouts() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            attempt_timeout: Duration::from_secs(1),
        };
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_retry_when(
            &policy,
            "slow op",
            |err| match err {
                AppError::Timeout { .. } => ErrorRetryStrategy::Fail,
                other => other.retry_strategy(),
            },
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::Timeout { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
