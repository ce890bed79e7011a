//! # Product Authenticity Verification Engine
//!
//! Decides whether a product is genuine, with what confidence, from signals read
//! off a distributed ledger.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - Combine six independent trust signals into a 0-100 confidence score
//! - Cache decisions for a fixed TTL to avoid repeated ledger reads
//! - Retry transient ledger failures with linear backoff
//! - Pace bulk verification to a requested rate
//!
//! ## Scoring
//!
//! | Signal | Max points |
//! |--------|-----------|
//! | Hash validity | 30 |
//! | Supply-chain completeness | 25 |
//! | Confirmation depth | 15 |
//! | Manufacturer history | 15 |
//! | Historical pattern | 10 |
//! | Signature validity | 5 |
//!
//! A failed checkpoint costs 20 points, a prior counterfeit finding 30. A product
//! is authentic when its registry status is verified and it scores at least 70.
//!
//! ## Module Structure
//!
//! ```text
//! av-verification-engine/
//! ├── domain/          # Records, results, errors, config, invariants
//! ├── algorithms/      # Scoring, certificates
//! ├── ports/           # AuthenticityApi, LedgerGateway, ProvenanceIndex, TimeSource
//! ├── service/         # Cache, retry, batch pacing, engine
//! ├── adapters/        # In-memory ledger
//! └── cancellation     # Cooperative cancellation signal
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod cancellation;
pub mod domain;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{InMemoryLedger, ProductFixture};
pub use algorithms::{assess, CertificateIssuer, ScoreReport, TrustSignals};
pub use cancellation::{Cancellation, CancellationHandle};
pub use domain::{
    Certificate, CertificateStatus, ConfidenceBreakdown, DataIntegrity, EngineConfig,
    EngineConfigBuilder, GatewayError, ProductRecord, ProductStatus, StepStatus,
    SupplyChainStep, Timestamp, VerificationError, VerificationOutcome, VerificationRecord,
    VerificationResult, AUTHENTICITY_THRESHOLD,
};
pub use ports::{
    AuthenticityApi, LedgerGateway, LedgerRecord, MockTimeSource, ProductAttributes,
    ProvenanceIndex, SystemTimeSource, TimeSource,
};
pub use service::{
    AuthenticityEngine, BatchRateLimiter, RetryExecutor, RetryPolicy, SignalCollector,
    VerificationCache,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
