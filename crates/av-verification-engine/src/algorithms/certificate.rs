//! Authenticity certificates.
//!
//! A certificate is derived from a finished verification result. With a fixed clock
//! and a seeded generator the output is fully deterministic.

use crate::domain::{
    Certificate, CertificateStatus, VerificationResult, CERTIFICATE_VALIDITY_MS,
};
use crate::ports::TimeSource;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

/// Issues certificates for verification results.
pub struct CertificateIssuer {
    clock: Arc<dyn TimeSource>,
    rng: Mutex<StdRng>,
}

impl CertificateIssuer {
    /// Issuer seeded from OS entropy.
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            clock,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Issuer with a reproducible identifier sequence.
    pub fn with_seed(clock: Arc<dyn TimeSource>, seed: u64) -> Self {
        Self {
            clock,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Issue a certificate for `result`.
    pub fn issue(&self, result: &VerificationResult) -> Certificate {
        let issued_at = self.clock.now();
        let expires_at = issued_at + CERTIFICATE_VALIDITY_MS;

        let mut bytes = [0u8; 16];
        self.rng.lock().fill_bytes(&mut bytes);
        let certificate_id = format!(
            "CERT-{}",
            uuid::Builder::from_random_bytes(bytes)
                .into_uuid()
                .simple()
                .to_string()
                .to_uppercase()
        );

        let status = if result.is_authentic {
            CertificateStatus::Authentic
        } else {
            CertificateStatus::Counterfeit
        };

        let mut hasher = Sha256::new();
        hasher.update(certificate_id.as_bytes());
        hasher.update(result.product_id.as_bytes());
        hasher.update(status.as_str().as_bytes());
        hasher.update([result.confidence_score]);
        hasher.update(issued_at.to_be_bytes());
        hasher.update(expires_at.to_be_bytes());
        hasher.update(result.verification_timestamp.to_be_bytes());
        let certificate_hash = format!("0x{}", hex::encode(hasher.finalize()));

        debug!(
            product_id = %result.product_id,
            certificate_id = %certificate_id,
            status = %status,
            "Issued authenticity certificate"
        );

        Certificate {
            certificate_id,
            issued_at,
            expires_at,
            product_id: result.product_id.clone(),
            status,
            confidence_score: result.confidence_score,
            certificate_hash,
        }
    }
}
