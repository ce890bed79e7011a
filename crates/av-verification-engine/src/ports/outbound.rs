//! # Outbound Ports
//!
//! Traits for external dependencies: the ledger, the provenance index and the clock.

use crate::domain::{
    GatewayError, ProductStatus, SupplyChainStep, Timestamp, VerificationRecord,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Raw product registration as stored on the ledger.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerRecord {
    /// Display name.
    pub name: String,
    /// Manufacturer address.
    pub manufacturer: String,
    /// Registration time.
    pub registered_at: Timestamp,
    /// `0x`-prefixed data hash.
    pub data_hash: String,
    /// Off-chain metadata location.
    pub metadata_uri: String,
}

/// Product attributes resolved from the registration metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductAttributes {
    /// Product category.
    pub category: String,
    /// Manufacturing time.
    pub manufactured_at: Timestamp,
    /// Production batch.
    pub batch_number: String,
    /// Serial number.
    pub serial_number: String,
    /// Registry status.
    pub status: ProductStatus,
    /// Verifications so far.
    pub verification_count: u64,
}

/// Ledger gateway - outbound port.
///
/// Both reads must be idempotent and side-effect-free.
#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Check whether the identifier has a registration.
    async fn is_registered(&self, product_id: &str) -> Result<bool, GatewayError>;

    /// Fetch the registration. Only called after `is_registered` returned true.
    async fn get_record(&self, product_id: &str) -> Result<LedgerRecord, GatewayError>;
}

/// Provenance index - outbound port.
///
/// History and reputation reads that complement the ledger record.
#[async_trait]
pub trait ProvenanceIndex: Send + Sync {
    /// Attributes from the product's registration metadata.
    async fn product_attributes(&self, product_id: &str)
        -> Result<ProductAttributes, GatewayError>;

    /// Checkpoints in chronological order.
    async fn supply_chain(&self, product_id: &str) -> Result<Vec<SupplyChainStep>, GatewayError>;

    /// Earlier verifications of the product.
    async fn verification_history(
        &self,
        product_id: &str,
    ) -> Result<Vec<VerificationRecord>, GatewayError>;

    /// Blocks elapsed since the product's registration.
    async fn confirmations(&self, product_id: &str) -> Result<u64, GatewayError>;

    /// Verified products from `manufacturer`, not counting `exclude_product`.
    async fn manufacturer_verified_count(
        &self,
        manufacturer: &str,
        exclude_product: &str,
    ) -> Result<u64, GatewayError>;
}

/// Time source for consistent timestamp handling.
///
/// Abstracted to allow testing with deterministic time.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        let elapsed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp::try_from(elapsed.as_millis()).unwrap_or(Timestamp::MAX)
    }
}

/// Manually driven time source for tests and simulations.
#[derive(Debug, Default)]
pub struct MockTimeSource {
    time: AtomicU64,
}

impl MockTimeSource {
    /// Start the clock at `initial` milliseconds.
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: AtomicU64::new(initial),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, ms: u64) {
        self.time.fetch_add(ms, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, time: Timestamp) {
        self.time.store(time, Ordering::SeqCst);
    }
}

impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(Ordering::SeqCst)
    }
}
