//! # Algorithms Module
//!
//! Confidence scoring and certificate derivation.

pub mod certificate;
pub mod scoring;

pub use certificate::CertificateIssuer;
pub use scoring::{assess, ScoreReport, TrustSignals};
