//! Bounded retry with linear backoff and cancellation.
//!
//! Onboarding and chunk uploads share this executor so both kinds of
//! operation get the same attempt/delay semantics, each with an independent
//! attempt budget.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Errors from [`retry`].
#[derive(Debug, thiserror::Error)]
pub enum RetryError {
    /// Every attempt failed. Carries the last underlying cause.
    #[error("retries exhausted after {attempts} attempt(s): {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The cancellation token fired before an attempt succeeded.
    #[error("cancelled")]
    Cancelled,
}

/// Callback invoked after each failed attempt, with the operation label,
/// the 1-based attempt number, and the error text.
pub type FailureCallback<'a> = &'a (dyn Fn(&str, u32, &str) + Send + Sync);

/// Retry policy, shared read-only by all retrying operations.
///
/// Delay scaling is linear by attempt number: the wait after failed attempt
/// `n` (1-based) is `base_delay * n`. No jitter, so delays and attempt
/// counts are deterministic and testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first. Must be at least 1;
    /// [`retry`] treats 0 as 1.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Invokes `op` up to `policy.max_attempts` times.
///
/// After each failure except the last, `on_failure` is invoked with `label`
/// and the attempt number, then the executor sleeps the policy delay before
/// the next attempt. Exhaustion fails with [`RetryError::Exhausted`]
/// wrapping the last cause.
///
/// The cancellation token is checked before every attempt and observed
/// during every inter-attempt sleep; cancellation aborts immediately with
/// [`RetryError::Cancelled`] regardless of remaining attempts.
pub async fn retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    label: &str,
    on_failure: FailureCallback<'_>,
    mut op: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        let err = match op().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempt >= max_attempts {
            return Err(RetryError::Exhausted {
                attempts: attempt,
                source: Box::new(err),
            });
        }

        on_failure(label, attempt, &err.to_string());
        let delay = policy.delay_for_attempt(attempt);
        debug!(
            label,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %err,
            "attempt failed, retrying"
        );

        tokio::select! {
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
