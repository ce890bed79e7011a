//! In-Memory Ledger Adapter
//!
//! Implements both `LedgerGateway` and `ProvenanceIndex` over an in-process product
//! table. Used by tests, benchmarks and local runs: it records every call with a
//! tokio timestamp and can inject transport failures.

use crate::domain::{
    GatewayError, ProductStatus, StepStatus, SupplyChainStep, Timestamp, VerificationOutcome,
    VerificationRecord, DAY_MS,
};
use crate::ports::outbound::{LedgerGateway, LedgerRecord, ProductAttributes, ProvenanceIndex};
use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Reference time for fixture timestamps (2023-11-14T22:13:20Z).
pub const FIXTURE_EPOCH: Timestamp = 1_700_000_000_000;

/// Everything the ledger knows about one product.
#[derive(Clone, Debug)]
pub struct ProductFixture {
    /// Product identifier.
    pub id: String,
    /// Ledger registration.
    pub record: LedgerRecord,
    /// Metadata attributes.
    pub attributes: ProductAttributes,
    /// Checkpoints.
    pub supply_chain: Vec<SupplyChainStep>,
    /// Prior verifications.
    pub history: Vec<VerificationRecord>,
    /// Blocks since registration.
    pub confirmations: u64,
}

impl ProductFixture {
    /// A verified product with a clean four-step supply chain, 15 confirmations and
    /// 120 prior verifications, registered 30 days before [`FIXTURE_EPOCH`].
    pub fn genuine(id: &str, manufacturer: &str) -> Self {
        let registered_at = FIXTURE_EPOCH - 30 * DAY_MS;
        let supply_chain = ["Factory", "Port of Rotterdam", "Warehouse", "Retailer"]
            .iter()
            .enumerate()
            .map(|(i, location)| SupplyChainStep {
                location: location.to_string(),
                timestamp: registered_at + (i as u64 + 1) * DAY_MS,
                handler: format!("0xhandler{i}"),
                transaction_id: derive_hash(&format!("{id}/step/{i}")),
                status: StepStatus::Completed,
                detail: None,
            })
            .collect();

        Self {
            id: id.to_string(),
            record: LedgerRecord {
                name: format!("Product {id}"),
                manufacturer: manufacturer.to_string(),
                registered_at,
                data_hash: derive_hash(id),
                metadata_uri: format!("ipfs://{id}"),
            },
            attributes: ProductAttributes {
                category: "general".to_string(),
                manufactured_at: registered_at - DAY_MS,
                batch_number: "BATCH-001".to_string(),
                serial_number: format!("SN-{id}"),
                status: ProductStatus::Verified,
                verification_count: 120,
            },
            supply_chain,
            history: Vec::new(),
            confirmations: 15,
        }
    }

    /// Replace the registry status.
    pub fn with_status(mut self, status: ProductStatus) -> Self {
        self.attributes.status = status;
        self
    }

    /// Replace the data hash.
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.record.data_hash = hash.into();
        self
    }

    /// Replace the confirmation depth.
    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations;
        self
    }

    /// Replace the verification counter.
    pub fn with_verification_count(mut self, count: u64) -> Self {
        self.attributes.verification_count = count;
        self
    }

    /// Replace the checkpoints.
    pub fn with_supply_chain(mut self, steps: Vec<SupplyChainStep>) -> Self {
        self.supply_chain = steps;
        self
    }

    /// Mark the last checkpoint as failed.
    pub fn with_failed_step(mut self) -> Self {
        if let Some(step) = self.supply_chain.last_mut() {
            step.status = StepStatus::Failed;
            step.detail = Some("Seal broken on arrival".to_string());
        }
        self
    }

    /// Append a prior verification with the given outcome.
    pub fn with_prior_verification(mut self, outcome: VerificationOutcome) -> Self {
        let n = self.history.len();
        self.history.push(VerificationRecord {
            id: format!("{}-ver-{n}", self.id),
            product_id: self.id.clone(),
            timestamp: self.record.registered_at + (n as u64 + 1) * DAY_MS,
            verifier: "0xinspector".to_string(),
            outcome,
            confidence_score: match outcome {
                VerificationOutcome::Verified => 90,
                VerificationOutcome::Suspicious => 50,
                VerificationOutcome::Counterfeit => 10,
            },
            transaction_id: derive_hash(&format!("{}/ver/{n}", self.id)),
        });
        self
    }

    /// Replace the registration time.
    pub fn registered_at(mut self, registered_at: Timestamp) -> Self {
        self.record.registered_at = registered_at;
        self
    }
}

/// Deterministic `0x`-prefixed SHA-256 digest of `seed`.
pub fn derive_hash(seed: &str) -> String {
    format!("0x{}", hex::encode(Sha256::digest(seed.as_bytes())))
}

/// One recorded port call.
#[derive(Clone, Debug)]
struct CallRecord {
    op: &'static str,
    product_id: String,
    at: Instant,
}

#[derive(Default)]
struct LedgerState {
    products: HashMap<String, ProductFixture>,
    manufacturer_reputation: HashMap<String, u64>,
    fail_next: Vec<GatewayError>,
    fail_always: HashMap<String, GatewayError>,
    calls: Vec<CallRecord>,
    latency: Duration,
}

/// In-memory implementation of the ledger and provenance ports.
#[derive(Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger pre-loaded with `fixtures`.
    pub fn with_products(fixtures: impl IntoIterator<Item = ProductFixture>) -> Self {
        let ledger = Self::new();
        for fixture in fixtures {
            ledger.insert(fixture);
        }
        ledger
    }

    /// Register or replace a product.
    pub fn insert(&self, fixture: ProductFixture) {
        self.state.lock().products.insert(fixture.id.clone(), fixture);
    }

    /// Remove a product.
    pub fn remove(&self, product_id: &str) -> Option<ProductFixture> {
        self.state.lock().products.remove(product_id)
    }

    /// Verified products attributed to `manufacturer` beyond those in the table.
    pub fn set_manufacturer_reputation(&self, manufacturer: &str, verified_products: u64) {
        self.state
            .lock()
            .manufacturer_reputation
            .insert(manufacturer.to_string(), verified_products);
    }

    /// Fail the next `count` calls, whatever they are, with `error`.
    pub fn fail_next(&self, count: usize, error: GatewayError) {
        let mut state = self.state.lock();
        state.fail_next.extend(std::iter::repeat(error).take(count));
    }

    /// Fail every call concerning `product_id` with `error`.
    pub fn fail_always(&self, product_id: &str, error: GatewayError) {
        self.state
            .lock()
            .fail_always
            .insert(product_id.to_string(), error);
    }

    /// Stop failing calls for `product_id`.
    pub fn heal(&self, product_id: &str) {
        self.state.lock().fail_always.remove(product_id);
    }

    /// Delay every call by `latency` (tokio time).
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    /// Operation names of the calls concerning `product_id`.
    pub fn calls_for(&self, product_id: &str) -> Vec<&'static str> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.product_id == product_id)
            .map(|c| c.op)
            .collect()
    }

    /// Arrival times of the registration checks, in order.
    pub fn registration_checks(&self) -> Vec<(String, Instant)> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.op == "is_registered")
            .map(|c| (c.product_id.clone(), c.at))
            .collect()
    }

    /// Total calls so far.
    pub fn call_count(&self) -> usize {
        self.state.lock().calls.len()
    }

    /// Log the call, apply latency and injected failures, then read the fixture.
    async fn enter<T>(
        &self,
        op: &'static str,
        product_id: &str,
        read: impl FnOnce(&LedgerState) -> Result<T, GatewayError>,
    ) -> Result<T, GatewayError> {
        let latency = {
            let mut state = self.state.lock();
            state.calls.push(CallRecord {
                op,
                product_id: product_id.to_string(),
                at: Instant::now(),
            });
            state.latency
        };

        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;
        if !state.fail_next.is_empty() {
            let error = state.fail_next.remove(0);
            debug!(op, product_id, %error, "Injected failure");
            return Err(error);
        }
        if let Some(error) = state.fail_always.get(product_id) {
            debug!(op, product_id, %error, "Injected failure");
            return Err(error.clone());
        }
        read(state)
    }
}

fn fixture<'a>(
    state: &'a LedgerState,
    product_id: &str,
) -> Result<&'a ProductFixture, GatewayError> {
    state
        .products
        .get(product_id)
        .ok_or_else(|| GatewayError::RecordMissing(product_id.to_string()))
}

#[async_trait]
impl LedgerGateway for InMemoryLedger {
    async fn is_registered(&self, product_id: &str) -> Result<bool, GatewayError> {
        self.enter("is_registered", product_id, |state| {
            Ok(state.products.contains_key(product_id))
        })
        .await
    }

    async fn get_record(&self, product_id: &str) -> Result<LedgerRecord, GatewayError> {
        self.enter("get_record", product_id, |state| {
            fixture(state, product_id).map(|f| f.record.clone())
        })
        .await
    }
}

#[async_trait]
impl ProvenanceIndex for InMemoryLedger {
    async fn product_attributes(
        &self,
        product_id: &str,
    ) -> Result<ProductAttributes, GatewayError> {
        self.enter("product_attributes", product_id, |state| {
            fixture(state, product_id).map(|f| f.attributes.clone())
        })
        .await
    }

    async fn supply_chain(&self, product_id: &str) -> Result<Vec<SupplyChainStep>, GatewayError> {
        self.enter("supply_chain", product_id, |state| {
            fixture(state, product_id).map(|f| f.supply_chain.clone())
        })
        .await
    }

    async fn verification_history(
        &self,
        product_id: &str,
    ) -> Result<Vec<VerificationRecord>, GatewayError> {
        self.enter("verification_history", product_id, |state| {
            fixture(state, product_id).map(|f| f.history.clone())
        })
        .await
    }

    async fn confirmations(&self, product_id: &str) -> Result<u64, GatewayError> {
        self.enter("confirmations", product_id, |state| {
            fixture(state, product_id).map(|f| f.confirmations)
        })
        .await
    }

    async fn manufacturer_verified_count(
        &self,
        manufacturer: &str,
        exclude_product: &str,
    ) -> Result<u64, GatewayError> {
        self.enter("manufacturer_verified_count", exclude_product, |state| {
            let listed = state
                .products
                .values()
                .filter(|f| {
                    f.id != exclude_product
                        && f.record.manufacturer == manufacturer
                        && f.attributes.status == ProductStatus::Verified
                })
                .count() as u64;
            let reputation = state
                .manufacturer_reputation
                .get(manufacturer)
                .copied()
                .unwrap_or(0);
            Ok(listed + reputation)
        })
        .await
    }
}
