//! Prometheus metrics for the authenticity engine.
//!
//! All metrics follow the naming convention: `av_<component>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., verifications_total)
//! - **Histogram**: Distribution of values (e.g., verification_duration_seconds)

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, linear_buckets, Counter, CounterVec, Encoder, Histogram, HistogramOpts,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // VERIFICATION METRICS
    // =========================================================================

    /// Verifications by outcome
    pub static ref VERIFICATIONS: CounterVec = CounterVec::new(
        Opts::new("av_verifications_total", "Product verifications by outcome"),
        &["outcome"]  // outcome: authentic/not_authentic/not_registered/failed/cancelled
    ).expect("metric creation failed");

    /// Distribution of confidence scores handed out
    pub static ref CONFIDENCE_SCORES: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "av_verification_confidence_score",
            "Confidence scores of computed verifications"
        ).buckets(linear_buckets(10.0, 10.0, 10).expect("valid buckets"))
    ).expect("metric creation failed");

    /// End-to-end verification latency (cache and retries included)
    pub static ref VERIFICATION_DURATION: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "av_verification_duration_seconds",
            "Time spent serving a verification"
        ).buckets(exponential_buckets(0.0005, 2.0, 16).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // CACHE METRICS
    // =========================================================================

    /// Cache hits
    pub static ref CACHE_HITS: Counter = Counter::new(
        "av_cache_hits_total",
        "Verifications served from cache"
    ).expect("metric creation failed");

    /// Cache misses
    pub static ref CACHE_MISSES: Counter = Counter::new(
        "av_cache_misses_total",
        "Verifications that ran the scoring pipeline"
    ).expect("metric creation failed");

    // =========================================================================
    // RESILIENCE METRICS
    // =========================================================================

    /// Retries after transient gateway failures
    pub static ref RETRY_ATTEMPTS: Counter = Counter::new(
        "av_retry_attempts_total",
        "Attempts repeated after a transient gateway failure"
    ).expect("metric creation failed");

    /// Batch entries replaced by a failure placeholder
    pub static ref BATCH_ENTRY_FAILURES: Counter = Counter::new(
        "av_batch_entry_failures_total",
        "Batch entries that exhausted retries"
    ).expect("metric creation failed");
}

/// Handle proving the metrics are registered
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Verification
        Box::new(VERIFICATIONS.clone()),
        Box::new(CONFIDENCE_SCORES.clone()),
        Box::new(VERIFICATION_DURATION.clone()),
        // Cache
        Box::new(CACHE_HITS.clone()),
        Box::new(CACHE_MISSES.clone()),
        // Resilience
        Box::new(RETRY_ATTEMPTS.clone()),
        Box::new(BATCH_ENTRY_FAILURES.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Timer guard for automatic histogram observation.
pub struct HistogramTimer {
    histogram: Histogram,
    start: std::time::Instant,
}

impl HistogramTimer {
    /// Start a new timer for the given histogram.
    pub fn new(histogram: &Histogram) -> Self {
        Self {
            histogram: histogram.clone(),
            start: std::time::Instant::now(),
        }
    }
}

impl Drop for HistogramTimer {
    fn drop(&mut self) {
        self.histogram.observe(self.start.elapsed().as_secs_f64());
    }
}
