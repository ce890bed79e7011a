//! # Domain Errors
//!
//! Error taxonomy for authenticity verification.
//!
//! Only [`VerificationError::Gateway`] is transient and retried. Unknown products are
//! recovered into a score-0 result by the engine; cancellation is never retried.

use thiserror::Error;

/// Failure while talking to the ledger or the provenance index.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// Call did not complete in time.
    #[error("Gateway timeout after {0} ms")]
    Timeout(u64),

    /// Endpoint could not be reached.
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    /// Endpoint answered with an error.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Registered product whose record could not be read.
    #[error("Record missing for registered product: {0}")]
    RecordMissing(String),
}

/// Verification error types.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum VerificationError {
    /// The identifier has no ledger record.
    #[error("Product not registered: {0}")]
    NotRegistered(String),

    /// Transport failure; the last one is surfaced once retries are exhausted.
    #[error("Ledger gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Caller cancelled the call or batch.
    #[error("Verification cancelled")]
    Cancelled,

    /// Empty or malformed product identifier.
    #[error("Invalid product id: {0:?}")]
    InvalidProductId(String),

    /// Engine configured with unusable parameters.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl VerificationError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Gateway(_))
    }
}
