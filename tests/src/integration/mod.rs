//! # Integration Flows
//!
//! The engine wired to the in-memory ledger on a mock clock, exercised through
//! its public API.

pub mod concurrency_flows;
pub mod verification_flows;

use av_verification_engine::adapters::FIXTURE_EPOCH;
use av_verification_engine::{
    AuthenticityEngine, EngineConfig, InMemoryLedger, MockTimeSource, ProductFixture,
};
use std::sync::Arc;

/// Manufacturer used by every fixture product.
pub const MANUFACTURER: &str = "0xacme";

/// Engine under test plus handles on its collaborators.
pub struct Harness {
    /// The engine.
    pub engine: AuthenticityEngine<InMemoryLedger, InMemoryLedger>,
    /// Ledger and provenance stub.
    pub ledger: Arc<InMemoryLedger>,
    /// Wall clock seen by cache and scoring.
    pub clock: Arc<MockTimeSource>,
}

impl Harness {
    /// Engine over genuine fixtures for `ids`, with a reputable manufacturer.
    pub fn with_products(ids: &[&str], config: EngineConfig) -> Self {
        let ledger = InMemoryLedger::with_products(
            ids.iter().map(|id| ProductFixture::genuine(id, MANUFACTURER)),
        );
        ledger.set_manufacturer_reputation(MANUFACTURER, 60);
        Self::over(Arc::new(ledger), config)
    }

    /// Engine over an existing ledger.
    pub fn over(ledger: Arc<InMemoryLedger>, config: EngineConfig) -> Self {
        let clock = Arc::new(MockTimeSource::new(FIXTURE_EPOCH));
        let engine =
            AuthenticityEngine::with_clock(ledger.clone(), ledger.clone(), config, clock.clone())
                .expect("valid config")
                .with_certificate_seed(42);
        Self {
            engine,
            ledger,
            clock,
        }
    }
}
