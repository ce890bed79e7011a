//! Retry with linear backoff.
//!
//! Attempt `n` that fails (and is not the last) is followed by a delay of
//! `base_delay * n`. Only transport errors are retried; everything else, including
//! cancellation, returns at once. Delays are cancellable.

use crate::cancellation::Cancellation;
use crate::domain::{EngineConfig, VerificationError, DEFAULT_MAX_RETRIES};
use av_telemetry::RETRY_ATTEMPTS;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Attempt budget and backoff unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Backoff unit.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(1_000),
        }
    }
}

impl RetryPolicy {
    /// Policy taken from engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_attempts: config.max_retries,
            base_delay: config.retry_base_delay(),
        }
    }

    /// Delay after failed attempt `attempt` (1-indexed).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }
}

/// Runs operations under a [`RetryPolicy`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Executor for `policy`.
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Run `operation` until it succeeds, fails permanently, or the budget is spent.
    ///
    /// `operation` receives the 1-indexed attempt number. On exhaustion the last
    /// error is returned.
    pub async fn run<T, F, Fut>(
        &self,
        op_name: &str,
        cancel: &Cancellation,
        mut operation: F,
    ) -> Result<T, VerificationError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, VerificationError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            let error = match cancel.run(operation(attempt)).await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(op = op_name, attempt, "Succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            if attempt >= max_attempts {
                warn!(
                    op = op_name,
                    attempts = attempt,
                    error = %error,
                    "Retries exhausted"
                );
                return Err(error);
            }

            let delay = self.policy.delay_after(attempt);
            warn!(
                op = op_name,
                attempt,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "Attempt failed, retrying"
            );
            RETRY_ATTEMPTS.inc();

            cancel.sleep(delay).await?;
            attempt += 1;
        }
    }
}
