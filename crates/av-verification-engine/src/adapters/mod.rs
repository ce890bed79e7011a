//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implementations of the outbound ports.

mod in_memory_ledger;

pub use in_memory_ledger::{derive_hash, InMemoryLedger, ProductFixture, FIXTURE_EPOCH};
