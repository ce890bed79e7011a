//! Verification cache.
//!
//! Results are kept for a fixed TTL measured from write time on an injected clock.
//! Every lookup first drops all entries older than the TTL; there is no background
//! sweep. Concurrent misses for the same product are serialized through a per-key
//! async lock so the pipeline runs once and the second caller reads the stored result.

use crate::domain::{Timestamp, VerificationError, VerificationResult};
use crate::ports::TimeSource;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

struct CacheEntry {
    result: VerificationResult,
    stored_at: Timestamp,
}

/// Counters for cache activity.
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: AtomicU64,
    /// Lookups that found nothing.
    pub misses: AtomicU64,
    /// Results written.
    pub inserts: AtomicU64,
    /// Entries dropped for exceeding the TTL.
    pub expired: AtomicU64,
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that found nothing.
    pub misses: u64,
    /// Results written.
    pub inserts: u64,
    /// Entries dropped for exceeding the TTL.
    pub expired: u64,
}

/// TTL cache of verification results keyed by product id.
pub struct VerificationCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    ttl: Duration,
    clock: Arc<dyn TimeSource>,
    stats: CacheStats,
}

impl VerificationCache {
    /// Create an empty cache.
    pub fn new(clock: Arc<dyn TimeSource>, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            ttl,
            clock,
            stats: CacheStats::default(),
        }
    }

    /// Look up a live result, purging expired entries first.
    pub fn get(&self, product_id: &str) -> Option<VerificationResult> {
        let found = self.lookup(product_id);
        let counter = if found.is_some() {
            &self.stats.hits
        } else {
            &self.stats.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Store a result stamped with the current time.
    pub fn put(&self, product_id: &str, result: VerificationResult) {
        let stored_at = self.clock.now();
        self.entries
            .lock()
            .insert(product_id.to_string(), CacheEntry { result, stored_at });
        self.stats.inserts.fetch_add(1, Ordering::Relaxed);
    }

    /// Drop the entry for one product. Returns whether one was present.
    pub fn invalidate(&self, product_id: &str) -> bool {
        self.entries.lock().remove(product_id).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of stored entries, live or not yet purged.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Current counter values.
    pub fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            inserts: self.stats.inserts.load(Ordering::Relaxed),
            expired: self.stats.expired.load(Ordering::Relaxed),
        }
    }

    /// Return the cached result or compute, store and return a fresh one.
    ///
    /// The boolean is `true` for a cache hit. Errors are returned without caching.
    /// Only one computation per product runs at a time; callers that queued
    /// behind it are answered from the stored result.
    pub async fn get_or_try_insert_with<F, Fut>(
        &self,
        product_id: &str,
        compute: F,
    ) -> Result<(VerificationResult, bool), VerificationError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<VerificationResult, VerificationError>>,
    {
        if let Some(hit) = self.lookup(product_id) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((hit, true));
        }

        let slot = self.acquire_slot(product_id);
        let _permit = slot.lock.lock().await;

        if let Some(hit) = self.lookup(product_id) {
            debug!(product_id, "Served by concurrent computation");
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok((hit, true));
        }
        self.stats.misses.fetch_add(1, Ordering::Relaxed);

        let result = compute().await?;
        self.put(product_id, result.clone());
        Ok((result, false))
    }

    fn lookup(&self, product_id: &str) -> Option<VerificationResult> {
        let mut entries = self.entries.lock();
        self.purge_locked(&mut entries);
        entries.get(product_id).map(|entry| entry.result.clone())
    }

    fn purge_locked(&self, entries: &mut HashMap<String, CacheEntry>) {
        let now = self.clock.now();
        let ttl = self.ttl;
        let before = entries.len();
        entries.retain(|_, entry| {
            Duration::from_millis(now.saturating_sub(entry.stored_at)) <= ttl
        });
        let removed = before - entries.len();
        if removed > 0 {
            self.stats
                .expired
                .fetch_add(removed as u64, Ordering::Relaxed);
            debug!(removed, "Purged expired verification results");
        }
    }

    fn acquire_slot(&self, product_id: &str) -> InFlightSlot<'_> {
        let lock = self
            .in_flight
            .lock()
            .entry(product_id.to_string())
            .or_default()
            .clone();
        InFlightSlot {
            cache: self,
            product_id: product_id.to_string(),
            lock,
        }
    }
}

/// Per-key lock registration, removed from the map when the last holder leaves.
struct InFlightSlot<'a> {
    cache: &'a VerificationCache,
    product_id: String,
    lock: Arc<tokio::sync::Mutex<()>>,
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        let mut in_flight = self.cache.in_flight.lock();
        // The map holds one reference and this slot another.
        if Arc::strong_count(&self.lock) <= 2 {
            in_flight.remove(&self.product_id);
        }
    }
}
