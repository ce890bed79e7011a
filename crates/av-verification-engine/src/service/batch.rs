//! Batch rate limiting.
//!
//! Identifiers are processed one after another with a fixed pause of
//! `1000 / rps` milliseconds between calls and none after the last. A failure is
//! replaced by a placeholder so the output has exactly one entry per input id.

use crate::cancellation::Cancellation;
use crate::domain::{VerificationError, VerificationResult};
use av_telemetry::BATCH_ENTRY_FAILURES;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Paces sequential calls to a fixed rate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchRateLimiter {
    delay: Duration,
}

impl BatchRateLimiter {
    /// Limiter for `requests_per_second`; zero is treated as one.
    pub fn new(requests_per_second: u32) -> Self {
        let rps = u64::from(requests_per_second.max(1));
        Self {
            delay: Duration::from_millis(1_000 / rps),
        }
    }

    /// Pause between consecutive calls.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `verify` for every id in order.
    ///
    /// Errors other than cancellation become `placeholder(id)`. Cancellation
    /// aborts the batch and discards partial results. Duplicate ids are called
    /// each time; the last outcome wins.
    pub async fn run<F, Fut, P>(
        &self,
        product_ids: &[String],
        cancel: &Cancellation,
        mut verify: F,
        placeholder: P,
    ) -> Result<HashMap<String, VerificationResult>, VerificationError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<VerificationResult, VerificationError>>,
        P: Fn(&str) -> VerificationResult,
    {
        let mut results = HashMap::with_capacity(product_ids.len());
        let mut failures = 0usize;

        for (index, product_id) in product_ids.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(VerificationError::Cancelled);
            }

            let result = match verify(product_id.clone()).await {
                Ok(result) => result,
                Err(VerificationError::Cancelled) => return Err(VerificationError::Cancelled),
                Err(error) => {
                    warn!(product_id = %product_id, error = %error, "Batch entry failed");
                    BATCH_ENTRY_FAILURES.inc();
                    failures += 1;
                    placeholder(product_id)
                }
            };
            results.insert(product_id.clone(), result);

            if index + 1 < product_ids.len() {
                debug!(
                    product_id = %product_id,
                    delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
                    "Pacing batch"
                );
                cancel.sleep(self.delay).await?;
            }
        }

        info!(
            requested = product_ids.len(),
            failures, "Batch verification finished"
        );
        Ok(results)
    }
}
