//! Signal collection.
//!
//! Gathers everything the score calculator needs for one product. The registration
//! check always runs first; unknown products stop here with `NotRegistered`.

use crate::algorithms::TrustSignals;
use crate::domain::{ProductRecord, VerificationError};
use crate::ports::{LedgerGateway, ProvenanceIndex};
use std::sync::Arc;
use tracing::debug;

/// Reads trust signals from the ledger and the provenance index.
pub struct SignalCollector<L, P> {
    ledger: Arc<L>,
    provenance: Arc<P>,
}

impl<L, P> Clone for SignalCollector<L, P> {
    fn clone(&self) -> Self {
        Self {
            ledger: Arc::clone(&self.ledger),
            provenance: Arc::clone(&self.provenance),
        }
    }
}

impl<L: LedgerGateway, P: ProvenanceIndex> SignalCollector<L, P> {
    /// Collector over the given ports.
    pub fn new(ledger: Arc<L>, provenance: Arc<P>) -> Self {
        Self { ledger, provenance }
    }

    /// Collect the signals for `product_id`.
    ///
    /// Transport failures propagate unchanged so the caller can retry.
    pub async fn collect(&self, product_id: &str) -> Result<TrustSignals, VerificationError> {
        if !self.ledger.is_registered(product_id).await? {
            debug!(product_id, "Product not in registry");
            return Err(VerificationError::NotRegistered(product_id.to_string()));
        }

        let ledger_record = self.ledger.get_record(product_id).await?;
        let attributes = self.provenance.product_attributes(product_id).await?;

        let record = ProductRecord {
            id: product_id.to_string(),
            name: ledger_record.name,
            manufacturer: ledger_record.manufacturer,
            category: attributes.category,
            manufactured_at: attributes.manufactured_at,
            batch_number: attributes.batch_number,
            serial_number: attributes.serial_number,
            hash: ledger_record.data_hash,
            registered_at: ledger_record.registered_at,
            status: attributes.status,
            verification_count: attributes.verification_count,
            metadata_uri: ledger_record.metadata_uri,
        };

        let supply_chain = self.provenance.supply_chain(product_id).await?;
        let history = self.provenance.verification_history(product_id).await?;
        let confirmations = self.provenance.confirmations(product_id).await?;
        let manufacturer_verified_count = self
            .provenance
            .manufacturer_verified_count(&record.manufacturer, product_id)
            .await?;

        debug!(
            product_id,
            steps = supply_chain.len(),
            prior_verifications = history.len(),
            confirmations,
            "Collected trust signals"
        );

        Ok(TrustSignals {
            record,
            supply_chain,
            history,
            confirmations,
            manufacturer_verified_count,
        })
    }
}
