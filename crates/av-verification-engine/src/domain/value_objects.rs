//! # Domain Value Objects
//!
//! Immutable status tags and constants for product authenticity verification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp in milliseconds.
pub type Timestamp = u64;

/// One day in milliseconds.
pub const DAY_MS: u64 = 24 * 60 * 60 * 1000;

/// Certificates are valid for one year from issuance.
pub const CERTIFICATE_VALIDITY_MS: u64 = 365 * DAY_MS;

/// Registrations older than five years are implausible.
pub const MAX_REGISTRATION_AGE_MS: u64 = 5 * 365 * DAY_MS;

/// Minimum confidence score for an authentic verdict.
pub const AUTHENTICITY_THRESHOLD: u8 = 70;

/// Minimum confirmations for `blockchain_confirmed`.
pub const MIN_CONFIRMATIONS: u64 = 3;

/// Registry status of a product.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    /// Registered and vouched for by its manufacturer.
    Verified,
    /// Registered without manufacturer confirmation.
    #[default]
    Unverified,
    /// Registration in progress.
    Pending,
    /// Flagged as counterfeit.
    Counterfeit,
}

impl ProductStatus {
    /// Lowercase tag used on the ledger.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verified => "verified",
            Self::Unverified => "unverified",
            Self::Pending => "pending",
            Self::Counterfeit => "counterfeit",
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a single supply-chain checkpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    /// Handover completed.
    Completed,
    /// Goods are moving between checkpoints.
    InTransit,
    /// Checkpoint rejected the goods.
    Failed,
}

/// Outcome recorded by an earlier verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationOutcome {
    /// Product was found genuine.
    Verified,
    /// Product was found counterfeit.
    Counterfeit,
    /// Verifier could not decide.
    Suspicious,
}

/// Status printed on an authenticity certificate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CertificateStatus {
    /// Verdict was authentic.
    Authentic,
    /// Verdict was not authentic.
    Counterfeit,
}

impl CertificateStatus {
    /// Uppercase tag printed on the certificate.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentic => "AUTHENTIC",
            Self::Counterfeit => "COUNTERFEIT",
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
