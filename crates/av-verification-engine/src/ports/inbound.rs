//! # Inbound Ports
//!
//! API trait defining what the authenticity engine offers its callers.

use crate::cancellation::Cancellation;
use crate::domain::{Certificate, VerificationError, VerificationResult};
use async_trait::async_trait;
use std::collections::HashMap;

/// Authenticity API - inbound port.
#[async_trait]
pub trait AuthenticityApi: Send + Sync {
    /// Verify one product. `None` or a blank verifier falls back to the configured default.
    async fn verify(
        &self,
        product_id: &str,
        verifier: Option<&str>,
    ) -> Result<VerificationResult, VerificationError>;

    /// Verify one product, observing `cancel` at every suspension point.
    async fn verify_with_cancel(
        &self,
        product_id: &str,
        verifier: Option<&str>,
        cancel: &Cancellation,
    ) -> Result<VerificationResult, VerificationError>;

    /// Verify products sequentially at `requests_per_second`.
    ///
    /// The map holds one entry per distinct input id, failures included.
    async fn verify_many(
        &self,
        product_ids: &[String],
        verifier: Option<&str>,
        requests_per_second: Option<u32>,
    ) -> HashMap<String, VerificationResult>;

    /// Cancellable [`AuthenticityApi::verify_many`].
    async fn verify_many_with_cancel(
        &self,
        product_ids: &[String],
        verifier: Option<&str>,
        requests_per_second: Option<u32>,
        cancel: &Cancellation,
    ) -> Result<HashMap<String, VerificationResult>, VerificationError>;

    /// Derive a certificate from a verification result.
    fn certificate_of(&self, result: &VerificationResult) -> Certificate;

    /// Drop a cached result so the next verification recomputes it.
    fn invalidate(&self, product_id: &str) -> bool;
}
