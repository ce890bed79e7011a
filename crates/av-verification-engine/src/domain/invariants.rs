//! # Domain Invariants
//!
//! Format and plausibility rules shared by scoring and the engine.

use super::value_objects::{
    ProductStatus, Timestamp, AUTHENTICITY_THRESHOLD, MAX_REGISTRATION_AGE_MS, MIN_CONFIRMATIONS,
};

/// Length of a `0x`-prefixed 32-byte hex digest.
pub const HASH_STRING_LEN: usize = 66;

/// Invariant: hash is `0x` followed by 64 hex digits and is not all zeros.
pub fn is_valid_hash(hash: &str) -> bool {
    let Some(digits) = hash.strip_prefix("0x") else {
        return false;
    };
    hash.len() == HASH_STRING_LEN
        && digits.bytes().all(|b| b.is_ascii_hexdigit())
        && digits.bytes().any(|b| b != b'0')
}

/// Invariant: registration is not in the future and at most five years old.
pub fn is_plausible_registration(registered_at: Timestamp, now: Timestamp) -> bool {
    registered_at <= now && now - registered_at <= MAX_REGISTRATION_AGE_MS
}

/// Invariant: verdict is authentic iff status is verified and score reaches 70.
pub fn authenticity_verdict(status: ProductStatus, score: u8) -> bool {
    status == ProductStatus::Verified && score >= AUTHENTICITY_THRESHOLD
}

/// Invariant: a valid hash with at least three confirmations counts as on-chain.
pub fn is_blockchain_confirmed(hash_valid: bool, confirmations: u64) -> bool {
    hash_valid && confirmations >= MIN_CONFIRMATIONS
}
