//! # Domain Entities
//!
//! Products, checkpoints, verification history and the results the engine hands out.

use super::value_objects::{
    CertificateStatus, ProductStatus, StepStatus, Timestamp, VerificationOutcome,
};
use serde::{Deserialize, Serialize};

/// Warning attached to results for identifiers the ledger does not know.
pub const WARNING_NOT_REGISTERED: &str = "Product not found in blockchain registry";

/// Warning attached to batch placeholders whose verification failed.
pub const WARNING_VERIFICATION_FAILED: &str = "Verification failed";

/// A registered product as assembled from the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Manufacturer identifier (ledger address).
    pub manufacturer: String,
    /// Product category.
    pub category: String,
    /// Manufacturing time.
    pub manufactured_at: Timestamp,
    /// Production batch.
    pub batch_number: String,
    /// Serial number.
    pub serial_number: String,
    /// `0x`-prefixed 32-byte hex digest.
    pub hash: String,
    /// Ledger registration time.
    pub registered_at: Timestamp,
    /// Registry status.
    pub status: ProductStatus,
    /// Number of times the product has been verified.
    pub verification_count: u64,
    /// Off-chain metadata location.
    pub metadata_uri: String,
}

/// A recorded handover or location event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyChainStep {
    /// Location label.
    pub location: String,
    /// Time of the event.
    pub timestamp: Timestamp,
    /// Handler identifier.
    pub handler: String,
    /// Ledger transaction that recorded the step.
    pub transaction_id: String,
    /// Checkpoint status.
    pub status: StepStatus,
    /// Free-text detail.
    pub detail: Option<String>,
}

impl SupplyChainStep {
    /// Whether the checkpoint rejected the goods.
    pub fn is_failed(&self) -> bool {
        self.status == StepStatus::Failed
    }
}

/// An earlier verification of a product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Record identifier.
    pub id: String,
    /// Product the record is about.
    pub product_id: String,
    /// Time of the verification.
    pub timestamp: Timestamp,
    /// Who verified.
    pub verifier: String,
    /// What they concluded.
    pub outcome: VerificationOutcome,
    /// Score they recorded.
    pub confidence_score: u8,
    /// Ledger transaction that recorded the verification.
    pub transaction_id: String,
}

/// Point allocations behind a confidence score.
///
/// `total()` is the final score: the six allocations minus the penalty points
/// that were actually deducted from the running total.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceBreakdown {
    /// Hash validity (max 30).
    pub hash_validity: u8,
    /// Supply-chain completeness (max 25).
    pub supply_chain: u8,
    /// Confirmation depth (max 15).
    pub confirmations: u8,
    /// Manufacturer history (max 15).
    pub manufacturer_history: u8,
    /// Historical verification pattern (max 10).
    pub historical_pattern: u8,
    /// Signature validity (max 5).
    pub signature: u8,
    /// Points removed by the failed-checkpoint and counterfeit-flag penalties.
    pub penalty: u8,
    /// Human-readable warnings.
    pub warnings: Vec<String>,
}

impl ConfidenceBreakdown {
    /// Sum of the six allocations before penalties.
    pub fn gross(&self) -> u16 {
        [
            self.hash_validity,
            self.supply_chain,
            self.confirmations,
            self.manufacturer_history,
            self.historical_pattern,
            self.signature,
        ]
        .iter()
        .map(|p| u16::from(*p))
        .sum()
    }

    /// Final score in `[0, 100]`.
    pub fn total(&self) -> u8 {
        self.gross().saturating_sub(u16::from(self.penalty)).min(100) as u8
    }
}

/// Integrity checks reported alongside a verdict.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIntegrity {
    /// Product hash is well formed.
    pub hash_valid: bool,
    /// Registration time is plausible.
    pub timestamp_valid: bool,
    /// Signature check passed.
    pub signature_valid: bool,
    /// Hash valid and at least three confirmations.
    pub blockchain_confirmed: bool,
    /// Supply chain is present and no checkpoint failed.
    pub supply_chain_intact: bool,
    /// Every warning raised while scoring.
    pub warnings: Vec<String>,
}

/// Outcome of verifying one product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Identifier that was verified.
    pub product_id: String,
    /// Final verdict.
    pub is_authentic: bool,
    /// Confidence in `[0, 100]`.
    pub confidence_score: u8,
    /// Ledger record, absent for unknown or failed lookups.
    pub product: Option<ProductRecord>,
    /// Chronological checkpoints.
    pub supply_chain: Vec<SupplyChainStep>,
    /// When the verdict was computed (not when it was served from cache).
    pub verification_timestamp: Timestamp,
    /// Who asked.
    pub verifier: String,
    /// Integrity checks.
    pub data_integrity: DataIntegrity,
    /// Point allocations, present only for scored results.
    pub breakdown: Option<ConfidenceBreakdown>,
}

impl VerificationResult {
    /// Result for an identifier the ledger does not know.
    pub fn not_registered(product_id: &str, verifier: &str, now: Timestamp) -> Self {
        Self::terminal(product_id, verifier, now, WARNING_NOT_REGISTERED)
    }

    /// Placeholder for a verification whose retries were exhausted.
    pub fn failed(product_id: &str, verifier: &str, now: Timestamp) -> Self {
        Self::terminal(product_id, verifier, now, WARNING_VERIFICATION_FAILED)
    }

    fn terminal(product_id: &str, verifier: &str, now: Timestamp, warning: &str) -> Self {
        Self {
            product_id: product_id.to_string(),
            is_authentic: false,
            confidence_score: 0,
            product: None,
            supply_chain: Vec::new(),
            verification_timestamp: now,
            verifier: verifier.to_string(),
            data_integrity: DataIntegrity {
                warnings: vec![warning.to_string()],
                ..Default::default()
            },
            breakdown: None,
        }
    }

    /// Warnings raised for this result.
    pub fn warnings(&self) -> &[String] {
        &self.data_integrity.warnings
    }
}

/// Authenticity certificate derived from a result.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    /// Unique certificate identifier.
    pub certificate_id: String,
    /// Issuance time.
    pub issued_at: Timestamp,
    /// `issued_at` plus 365 days.
    pub expires_at: Timestamp,
    /// Product the certificate is about.
    pub product_id: String,
    /// Printed verdict.
    pub status: CertificateStatus,
    /// Score at issuance.
    pub confidence_score: u8,
    /// `0x`-prefixed SHA-256 over the certificate fields.
    pub certificate_hash: String,
}
