//! # Service Layer
//!
//! Stateful components around the pure scoring algorithm: cache, retries,
//! batch pacing, signal collection and the engine that composes them.

pub mod batch;
pub mod cache;
pub mod collector;
pub mod engine;
pub mod retry;

pub use batch::BatchRateLimiter;
pub use cache::{CacheStats, CacheStatsSnapshot, VerificationCache};
pub use collector::SignalCollector;
pub use engine::AuthenticityEngine;
pub use retry::{RetryExecutor, RetryPolicy};
