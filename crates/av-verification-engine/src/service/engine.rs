//! # Authenticity Engine
//!
//! Composes signal collection, scoring, caching, retries and batch pacing behind
//! the [`AuthenticityApi`] port.
//!
//! ## Flow
//!
//! ```text
//! verify(id) ─► retry ─► cache ─┬─ hit ──────────────────────────► result
//!                               └─ miss ─► collect ─► assess ─► store ─► result
//! ```
//!
//! Unknown products resolve to a score-0 result, which is cached like any other.
//! Transport failures are retried and never cached.

use crate::algorithms::{assess, CertificateIssuer};
use crate::cancellation::Cancellation;
use crate::domain::{Certificate, EngineConfig, VerificationError, VerificationResult};
use crate::ports::inbound::AuthenticityApi;
use crate::ports::outbound::{LedgerGateway, ProvenanceIndex, SystemTimeSource, TimeSource};
use crate::service::batch::BatchRateLimiter;
use crate::service::cache::VerificationCache;
use crate::service::collector::SignalCollector;
use crate::service::retry::{RetryExecutor, RetryPolicy};
use async_trait::async_trait;
use av_telemetry::{
    HistogramTimer, CACHE_HITS, CACHE_MISSES, CONFIDENCE_SCORES, VERIFICATIONS,
    VERIFICATION_DURATION,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Product authenticity verification engine.
pub struct AuthenticityEngine<L, P> {
    collector: SignalCollector<L, P>,
    cache: Arc<VerificationCache>,
    retry: RetryExecutor,
    issuer: CertificateIssuer,
    clock: Arc<dyn TimeSource>,
    config: EngineConfig,
}

impl<L: LedgerGateway, P: ProvenanceIndex> AuthenticityEngine<L, P> {
    /// Engine on the system clock.
    pub fn new(
        ledger: Arc<L>,
        provenance: Arc<P>,
        config: EngineConfig,
    ) -> Result<Self, VerificationError> {
        Self::with_clock(ledger, provenance, config, Arc::new(SystemTimeSource))
    }

    /// Engine on an injected clock. The cache and certificates use the same clock.
    pub fn with_clock(
        ledger: Arc<L>,
        provenance: Arc<P>,
        config: EngineConfig,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, VerificationError> {
        config.validate()?;

        let cache = Arc::new(VerificationCache::new(clock.clone(), config.cache_ttl()));
        info!(
            cache_ttl_secs = config.cache_ttl_secs,
            max_retries = config.max_retries,
            retry_base_delay_ms = config.retry_base_delay_ms,
            "Authenticity engine ready"
        );

        Ok(Self {
            collector: SignalCollector::new(ledger, provenance),
            cache,
            retry: RetryExecutor::new(RetryPolicy::from_config(&config)),
            issuer: CertificateIssuer::new(clock.clone()),
            clock,
            config,
        })
    }

    /// Use a seeded generator for certificate identifiers.
    pub fn with_certificate_seed(mut self, seed: u64) -> Self {
        self.issuer = CertificateIssuer::with_seed(self.clock.clone(), seed);
        self
    }

    /// The result cache.
    pub fn cache(&self) -> &Arc<VerificationCache> {
        &self.cache
    }

    /// Verify one product.
    pub async fn verify(
        &self,
        product_id: &str,
        verifier: Option<&str>,
    ) -> Result<VerificationResult, VerificationError> {
        self.verify_with_cancel(product_id, verifier, &Cancellation::never())
            .await
    }

    /// Verify one product, aborting with `Cancelled` once `cancel` fires.
    #[instrument(skip(self, verifier, cancel))]
    pub async fn verify_with_cancel(
        &self,
        product_id: &str,
        verifier: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<VerificationResult, VerificationError> {
        if product_id.trim().is_empty() {
            return Err(VerificationError::InvalidProductId(product_id.to_string()));
        }
        let verifier = self.resolve_verifier(verifier);
        let _timer = HistogramTimer::new(&VERIFICATION_DURATION);

        let outcome = self
            .retry
            .run("verify", cancel, move |attempt| async move {
                debug!(product_id, attempt, "Verification attempt");
                self.cache
                    .get_or_try_insert_with(product_id, move || self.evaluate(product_id, verifier))
                    .await
            })
            .await;

        match outcome {
            Ok((result, hit)) => {
                self.record_success(&result, hit);
                Ok(result)
            }
            Err(error) => {
                VERIFICATIONS
                    .with_label_values(&[failure_label(&error)])
                    .inc();
                warn!(product_id, error = %error, "Verification failed");
                Err(error)
            }
        }
    }

    /// Verify many products at `requests_per_second` (default from config).
    ///
    /// Always returns one entry per distinct input id; failures become placeholders.
    pub async fn verify_many(
        &self,
        product_ids: &[String],
        verifier: Option<&str>,
        requests_per_second: Option<u32>,
    ) -> HashMap<String, VerificationResult> {
        let outcome = self
            .verify_many_with_cancel(
                product_ids,
                verifier,
                requests_per_second,
                &Cancellation::never(),
            )
            .await;

        outcome.unwrap_or_else(|_| {
            let verifier = self.resolve_verifier(verifier);
            let now = self.clock.now();
            product_ids
                .iter()
                .map(|id| (id.clone(), VerificationResult::failed(id, verifier, now)))
                .collect()
        })
    }

    /// Cancellable batch verification. Cancellation discards partial results.
    pub async fn verify_many_with_cancel(
        &self,
        product_ids: &[String],
        verifier: Option<&str>,
        requests_per_second: Option<u32>,
        cancel: &Cancellation,
    ) -> Result<HashMap<String, VerificationResult>, VerificationError> {
        let rps = requests_per_second.unwrap_or(self.config.default_requests_per_second);
        let limiter = BatchRateLimiter::new(rps);
        let resolved = self.resolve_verifier(verifier);

        info!(
            count = product_ids.len(),
            requests_per_second = rps,
            delay_ms = u64::try_from(limiter.delay().as_millis()).unwrap_or(u64::MAX),
            "Starting batch verification"
        );

        limiter
            .run(
                product_ids,
                cancel,
                move |id| async move { self.verify_with_cancel(&id, verifier, cancel).await },
                |id| VerificationResult::failed(id, resolved, self.clock.now()),
            )
            .await
    }

    /// Issue a certificate for a finished verification.
    pub fn certificate_of(&self, result: &VerificationResult) -> Certificate {
        self.issuer.issue(result)
    }

    /// Drop the cached result for `product_id`.
    pub fn invalidate(&self, product_id: &str) -> bool {
        let removed = self.cache.invalidate(product_id);
        if removed {
            debug!(product_id, "Cached verification invalidated");
        }
        removed
    }

    fn resolve_verifier<'a>(&'a self, verifier: Option<&'a str>) -> &'a str {
        verifier
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(&self.config.default_verifier)
    }

    /// Collect and score one product. Unknown products become a score-0 result.
    async fn evaluate(
        &self,
        product_id: &str,
        verifier: &str,
    ) -> Result<VerificationResult, VerificationError> {
        let signals = match self.collector.collect(product_id).await {
            Ok(signals) => signals,
            Err(VerificationError::NotRegistered(_)) => {
                return Ok(VerificationResult::not_registered(
                    product_id,
                    verifier,
                    self.clock.now(),
                ));
            }
            Err(error) => return Err(error),
        };

        let now = self.clock.now();
        let report = assess(&signals, now);
        CONFIDENCE_SCORES.observe(f64::from(report.score));

        Ok(VerificationResult {
            product_id: product_id.to_string(),
            is_authentic: report.is_authentic,
            confidence_score: report.score,
            product: Some(signals.record),
            supply_chain: signals.supply_chain,
            verification_timestamp: now,
            verifier: verifier.to_string(),
            data_integrity: report.integrity,
            breakdown: Some(report.breakdown),
        })
    }

    fn record_success(&self, result: &VerificationResult, cache_hit: bool) {
        if cache_hit {
            CACHE_HITS.inc();
        } else {
            CACHE_MISSES.inc();
        }

        let label = if result.product.is_none() {
            "not_registered"
        } else if result.is_authentic {
            "authentic"
        } else {
            "not_authentic"
        };
        VERIFICATIONS.with_label_values(&[label]).inc();

        info!(
            product_id = %result.product_id,
            score = result.confidence_score,
            authentic = result.is_authentic,
            cache_hit,
            "Verification complete"
        );
    }
}

#[async_trait]
impl<L, P> AuthenticityApi for AuthenticityEngine<L, P>
where
    L: LedgerGateway + 'static,
    P: ProvenanceIndex + 'static,
{
    async fn verify(
        &self,
        product_id: &str,
        verifier: Option<&str>,
    ) -> Result<VerificationResult, VerificationError> {
        AuthenticityEngine::verify(self, product_id, verifier).await
    }

    async fn verify_with_cancel(
        &self,
        product_id: &str,
        verifier: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<VerificationResult, VerificationError> {
        AuthenticityEngine::verify_with_cancel(self, product_id, verifier, cancel).await
    }

    async fn verify_many(
        &self,
        product_ids: &[String],
        verifier: Option<&str>,
        requests_per_second: Option<u32>,
    ) -> HashMap<String, VerificationResult> {
        AuthenticityEngine::verify_many(self, product_ids, verifier, requests_per_second).await
    }

    async fn verify_many_with_cancel(
        &self,
        product_ids: &[String],
        verifier: Option<&str>,
        requests_per_second: Option<u32>,
        cancel: &Cancellation,
    ) -> Result<HashMap<String, VerificationResult>, VerificationError> {
        AuthenticityEngine::verify_many_with_cancel(
            self,
            product_ids,
            verifier,
            requests_per_second,
            cancel,
        )
        .await
    }

    fn certificate_of(&self, result: &VerificationResult) -> Certificate {
        AuthenticityEngine::certificate_of(self, result)
    }

    fn invalidate(&self, product_id: &str) -> bool {
        AuthenticityEngine::invalidate(self, product_id)
    }
}

/// Outcome label recorded for a verification that returned an error.
fn failure_label(error: &VerificationError) -> &'static str {
    match error {
        VerificationError::Cancelled => "cancelled",
        _ => "failed",
    }
}
