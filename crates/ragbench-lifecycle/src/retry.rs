//! Bounded retry of transient backend errors.

use std::future::Future;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use tracing::warn;

use ragbench_config::LifecycleConfig;
use ragbench_protocols::{BackendError, BackendKind};

/// Exponential backoff applied to lifecycle adapter calls.
///
/// Only [`BackendError::Unreachable`] is retried. Result shapes are the same
/// with or without retries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: usize,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay: initial_delay.saturating_mul(8),
        }
    }

    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn from_config(config: &LifecycleConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_delay_ms),
        )
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.initial_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.max_attempts.saturating_sub(1))
    }

    /// Run `op`, retrying while it reports the backend as unreachable.
    pub async fn run<T, F, Fut>(&self, kind: BackendKind, what: &str, op: F) -> Result<T, BackendError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BackendError>>,
    {
        op.retry(self.backoff())
            .when(BackendError::is_transient)
            .notify(|err: &BackendError, delay: Duration| {
                warn!(backend = %kind, "{} failed ({}), retrying in {:?}", what, err, delay);
            })
            .await
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LifecycleConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast(attempts: usize) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retries_unreachable_until_success() {
        let calls = AtomicUsize::new(0);
        let result = fast(3)
            .run(BackendKind::Vector, "create", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(BackendError::Unreachable("down".into()))
                } else {
                    Ok(7)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = fast(3)
            .run(BackendKind::Vector, "create", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::Unreachable("down".into()))
            })
            .await;
        assert!(result.unwrap_err().is_unreachable());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_operation_failures_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), _> = fast(5)
            .run(BackendKind::Relational, "drop", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(BackendError::OperationFailed("syntax".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts, 1);
    }
}
