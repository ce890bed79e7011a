//! # Confidence Scoring
//!
//! Pure mapping from collected trust signals to a confidence score.
//!
//! Six capped factors are added in a fixed order. Two penalties (a failed
//! checkpoint, a prior counterfeit flag) subtract from the running total, floored at
//! zero. The weights and thresholds are a fixed contract.
//!
//! | Factor | Max |
//! |--------|-----|
//! | Hash validity | 30 |
//! | Supply-chain completeness | 25 |
//! | Confirmation depth | 15 |
//! | Manufacturer history | 15 |
//! | Historical verification pattern | 10 |
//! | Signature validity | 5 |

use crate::domain::{
    authenticity_verdict, is_blockchain_confirmed, is_plausible_registration, is_valid_hash,
    ConfidenceBreakdown, DataIntegrity, ProductRecord, SupplyChainStep, Timestamp,
    VerificationOutcome, VerificationRecord,
};

/// Points for a well-formed product hash.
pub const HASH_POINTS: u8 = 30;
/// Points for a passing signature check.
pub const SIGNATURE_POINTS: u8 = 5;
/// Deduction for any failed checkpoint.
pub const FAILED_STEP_PENALTY: u8 = 20;
/// Deduction for any prior counterfeit verdict.
pub const COUNTERFEIT_FLAG_PENALTY: u8 = 30;

pub(crate) const WARN_INVALID_HASH: &str = "Invalid product hash format";
pub(crate) const WARN_NO_SUPPLY_CHAIN: &str = "Insufficient supply chain data";
pub(crate) const WARN_FAILED_STEP: &str = "Supply chain contains failed checkpoint(s)";
pub(crate) const WARN_LIMITED_MANUFACTURER: &str = "Manufacturer has limited verification history";
pub(crate) const WARN_COUNTERFEIT_FLAG: &str = "Product previously flagged as counterfeit";
pub(crate) const WARN_INVALID_SIGNATURE: &str = "Invalid cryptographic signature";
pub(crate) const WARN_IMPLAUSIBLE_TIMESTAMP: &str =
    "Registration timestamp is outside the plausible range";

/// Raw facts gathered for one product.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrustSignals {
    /// Assembled ledger record.
    pub record: ProductRecord,
    /// Chronological checkpoints.
    pub supply_chain: Vec<SupplyChainStep>,
    /// Earlier verifications.
    pub history: Vec<VerificationRecord>,
    /// Blocks since registration.
    pub confirmations: u64,
    /// Other verified products from the same manufacturer.
    pub manufacturer_verified_count: u64,
}

/// Everything the score calculator derives from a signal set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoreReport {
    /// Final score in `[0, 100]`.
    pub score: u8,
    /// Verdict: status verified and score at least 70.
    pub is_authentic: bool,
    /// Point allocations and warnings.
    pub breakdown: ConfidenceBreakdown,
    /// Integrity flags.
    pub integrity: DataIntegrity,
}

/// Running total that never drops below zero.
#[derive(Default)]
struct Tally {
    running: u16,
    penalty: u16,
}

impl Tally {
    fn add(&mut self, points: u8) -> u8 {
        self.running += u16::from(points);
        points
    }

    fn deduct(&mut self, points: u8) {
        let applied = u16::from(points).min(self.running);
        self.running -= applied;
        self.penalty += applied;
    }
}

/// Score a product.
///
/// Deterministic: identical inputs always yield identical reports.
pub fn assess(signals: &TrustSignals, now: Timestamp) -> ScoreReport {
    let record = &signals.record;
    let mut tally = Tally::default();
    let mut breakdown = ConfidenceBreakdown::default();
    let mut warnings = Vec::new();

    // 1. Hash validity
    let hash_valid = is_valid_hash(&record.hash);
    breakdown.hash_validity = tally.add(if hash_valid { HASH_POINTS } else { 0 });
    if !hash_valid {
        warnings.push(WARN_INVALID_HASH.to_string());
    }

    // 2. Supply-chain completeness
    let (chain_points, chain_warning) = supply_chain_points(signals.supply_chain.len());
    breakdown.supply_chain = tally.add(chain_points);
    warnings.extend(chain_warning);
    let has_failed_step = signals.supply_chain.iter().any(SupplyChainStep::is_failed);
    if has_failed_step {
        tally.deduct(FAILED_STEP_PENALTY);
        warnings.push(WARN_FAILED_STEP.to_string());
    }

    // 3. Confirmation depth
    let (confirmation_points, confirmation_warning) = confirmation_points(signals.confirmations);
    breakdown.confirmations = tally.add(confirmation_points);
    warnings.extend(confirmation_warning);

    // 4. Manufacturer history
    let (manufacturer_points, manufacturer_warning) =
        manufacturer_points(signals.manufacturer_verified_count);
    breakdown.manufacturer_history = tally.add(manufacturer_points);
    warnings.extend(manufacturer_warning);

    // 5. Historical verification pattern
    breakdown.historical_pattern = tally.add(history_points(record.verification_count));
    let flagged = signals
        .history
        .iter()
        .any(|r| r.outcome == VerificationOutcome::Counterfeit);
    if flagged {
        tally.deduct(COUNTERFEIT_FLAG_PENALTY);
        warnings.push(WARN_COUNTERFEIT_FLAG.to_string());
    }

    // 6. Signature validity
    let signature_valid = is_valid_hash(&record.hash);
    breakdown.signature = tally.add(if signature_valid { SIGNATURE_POINTS } else { 0 });
    if !signature_valid {
        warnings.push(WARN_INVALID_SIGNATURE.to_string());
    }

    let timestamp_valid = is_plausible_registration(record.registered_at, now);
    if !timestamp_valid {
        warnings.push(WARN_IMPLAUSIBLE_TIMESTAMP.to_string());
    }

    breakdown.penalty = tally.penalty as u8;
    breakdown.warnings = warnings.clone();
    let score = breakdown.total();
    debug_assert_eq!(u16::from(score), tally.running.min(100));

    ScoreReport {
        score,
        is_authentic: authenticity_verdict(record.status, score),
        integrity: DataIntegrity {
            hash_valid,
            timestamp_valid,
            signature_valid,
            blockchain_confirmed: is_blockchain_confirmed(hash_valid, signals.confirmations),
            supply_chain_intact: !signals.supply_chain.is_empty() && !has_failed_step,
            warnings,
        },
        breakdown,
    }
}

fn supply_chain_points(steps: usize) -> (u8, Option<String>) {
    match steps {
        n if n >= 4 => (25, None),
        3 => (18, Some("Supply chain has only 3 checkpoints".to_string())),
        2 => (10, Some("Supply chain has only 2 checkpoints".to_string())),
        _ => (0, Some(WARN_NO_SUPPLY_CHAIN.to_string())),
    }
}

fn confirmation_points(confirmations: u64) -> (u8, Option<String>) {
    match confirmations {
        n if n >= 12 => (15, None),
        n if n >= 6 => (10, Some(format!("Moderate blockchain confirmations ({n})"))),
        n if n >= 3 => (5, Some(format!("Low blockchain confirmations ({n})"))),
        n => (0, Some(format!("Insufficient blockchain confirmations ({n})"))),
    }
}

fn manufacturer_points(verified_products: u64) -> (u8, Option<String>) {
    match verified_products {
        n if n >= 50 => (15, None),
        n if n >= 20 => (12, None),
        n if n >= 5 => (8, None),
        _ => (3, Some(WARN_LIMITED_MANUFACTURER.to_string())),
    }
}

fn history_points(verification_count: u64) -> u8 {
    match verification_count {
        n if n >= 100 => 10,
        n if n >= 50 => 8,
        n if n >= 10 => 5,
        n if n >= 1 => 2,
        _ => 0,
    }
}
