//! Bounded retry with exponential backoff and cooperative cancellation.

use crate::errors::{UploadError, UploadResult};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Configuration for retry behavior
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total number of attempts, including the first
    pub max_attempts: u32,
    /// Base delay; the wait after failed attempt `k` is `base_delay * multiplier^k`
    pub base_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
    /// Upper bound for a single wait
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: crate::DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(1000),
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the total number of attempts
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }

    /// Set the base delay
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set backoff multiplier
    pub fn multiplier(mut self, m: f64) -> Self {
        self.multiplier = m;
        self
    }

    /// Set maximum delay
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Wait after failed attempt `attempt` (1-based)
    ///
    /// With the defaults this yields 2000 ms after the first failure and
    /// 4000 ms after the second.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = delay.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

/// Retry policy for determining if an error should be retried
pub trait RetryPolicy: Send + Sync {
    /// Check if an error is retryable
    fn is_retryable(&self, error: &UploadError) -> bool;

    /// Get the retry delay for an error (may override calculated delay)
    fn get_retry_delay(&self, error: &UploadError) -> Option<Duration>;
}

/// Retries every failure except cancellation
///
/// Remote rejections such as an unknown chat are retried too, which spends
/// the whole backoff budget on requests that cannot succeed. Use
/// [`TransientOnly`] to retry only network failures, 5xx and 429.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryAll;

impl RetryPolicy for RetryAll {
    fn is_retryable(&self, error: &UploadError) -> bool {
        !error.is_cancelled()
    }

    fn get_retry_delay(&self, _error: &UploadError) -> Option<Duration> {
        None
    }
}

/// Retries only transient failures and honors server `retry_after` hints
#[derive(Debug, Clone, Copy, Default)]
pub struct TransientOnly;

impl RetryPolicy for TransientOnly {
    fn is_retryable(&self, error: &UploadError) -> bool {
        error.is_transient()
    }

    fn get_retry_delay(&self, error: &UploadError) -> Option<Duration> {
        error.retry_after()
    }
}

/// Execute an operation with retry logic
///
/// The operation receives the 1-based attempt number. Both the operation
/// and the backoff waits race against `cancel`; cancellation ends the loop
/// with [`UploadError::Cancelled`]. Errors the policy refuses to retry are
/// returned unchanged, and running out of attempts yields
/// [`UploadError::RetriesExhausted`] wrapping the last error.
pub async fn with_retry<F, Fut, T>(
    config: &RetryConfig,
    policy: &dyn RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> UploadResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = UploadResult<T>>,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        if cancel.is_cancelled() {
            return Err(UploadError::Cancelled);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(UploadError::Cancelled),
            outcome = operation(attempt) => outcome,
        };

        let error = match outcome {
            Ok(result) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(error) => error,
        };

        if !policy.is_retryable(&error) {
            warn!(attempt, error = %error, "Operation failed permanently");
            return Err(error);
        }

        if attempt >= max_attempts {
            warn!(attempt, max_attempts, error = %error, "Retries exhausted");
            return Err(UploadError::RetriesExhausted {
                attempts: attempt,
                source: Box::new(error),
            });
        }

        let delay = policy
            .get_retry_delay(&error)
            .unwrap_or_else(|| config.delay_for_attempt(attempt));

        debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Retrying after failure"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(attempt, "Backoff interrupted by cancellation");
                return Err(UploadError::Cancelled);
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }
}
