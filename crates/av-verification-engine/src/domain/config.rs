//! Engine configuration and validation
//!
//! # Example
//!
//! ```ignore
//! use av_verification_engine::domain::EngineConfigBuilder;
//!
//! let config = EngineConfigBuilder::new()
//!     .max_retries(5)
//!     .retry_base_delay_ms(250)
//!     .build()
//!     .expect("Valid config");
//! ```

use super::errors::VerificationError;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default cache lifetime (5 minutes).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default number of attempts per verification.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay for linear backoff.
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 1_000;

/// Default batch throughput.
pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 5;

/// Verifier recorded when the caller does not identify itself.
pub const DEFAULT_VERIFIER: &str = "system";

/// Verification engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Seconds a cached result stays valid.
    pub cache_ttl_secs: u64,
    /// Total attempts per verification (not additional retries).
    pub max_retries: u32,
    /// Backoff unit; attempt `n` is followed by `n * base` milliseconds.
    pub retry_base_delay_ms: u64,
    /// Batch throughput used when the caller does not pass one.
    pub default_requests_per_second: u32,
    /// Verifier recorded for anonymous callers.
    pub default_verifier: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
            default_requests_per_second: DEFAULT_REQUESTS_PER_SECOND,
            default_verifier: DEFAULT_VERIFIER.to_string(),
        }
    }
}

impl EngineConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AV_CACHE_TTL_SECS`: Cache lifetime (default: 300)
    /// - `AV_MAX_RETRIES`: Attempts per verification (default: 3)
    /// - `AV_RETRY_BASE_DELAY_MS`: Backoff unit (default: 1000)
    /// - `AV_BATCH_RPS`: Default batch throughput (default: 5)
    /// - `AV_DEFAULT_VERIFIER`: Anonymous verifier id (default: system)
    ///
    /// Unparseable values fall back to the default; the result is validated.
    pub fn from_env() -> Result<Self, VerificationError> {
        let defaults = Self::default();

        let config = Self {
            cache_ttl_secs: parse_env("AV_CACHE_TTL_SECS").unwrap_or(defaults.cache_ttl_secs),
            max_retries: parse_env("AV_MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_base_delay_ms: parse_env("AV_RETRY_BASE_DELAY_MS")
                .unwrap_or(defaults.retry_base_delay_ms),
            default_requests_per_second: parse_env("AV_BATCH_RPS")
                .unwrap_or(defaults.default_requests_per_second),
            default_verifier: env::var("AV_DEFAULT_VERIFIER")
                .unwrap_or(defaults.default_verifier),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), VerificationError> {
        if self.cache_ttl_secs == 0 {
            return Err(VerificationError::InvalidConfig(
                "cache_ttl_secs cannot be 0".to_string(),
            ));
        }

        if self.max_retries == 0 {
            return Err(VerificationError::InvalidConfig(
                "max_retries must allow at least one attempt".to_string(),
            ));
        }

        if self.default_requests_per_second == 0 {
            return Err(VerificationError::InvalidConfig(
                "default_requests_per_second cannot be 0".to_string(),
            ));
        }

        if self.default_verifier.trim().is_empty() {
            return Err(VerificationError::InvalidConfig(
                "default_verifier cannot be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Cache lifetime as a duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Backoff unit as a duration.
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Builder for EngineConfig with validation
#[derive(Default)]
pub struct EngineConfigBuilder {
    cache_ttl_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_base_delay_ms: Option<u64>,
    default_requests_per_second: Option<u32>,
    default_verifier: Option<String>,
}

impl EngineConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set cache lifetime in seconds
    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = Some(secs);
        self
    }

    /// Set total attempts per verification
    pub fn max_retries(mut self, attempts: u32) -> Self {
        self.max_retries = Some(attempts);
        self
    }

    /// Set backoff unit in milliseconds
    pub fn retry_base_delay_ms(mut self, ms: u64) -> Self {
        self.retry_base_delay_ms = Some(ms);
        self
    }

    /// Set default batch throughput
    pub fn default_requests_per_second(mut self, rps: u32) -> Self {
        self.default_requests_per_second = Some(rps);
        self
    }

    /// Set verifier recorded for anonymous callers
    pub fn default_verifier(mut self, verifier: impl Into<String>) -> Self {
        self.default_verifier = Some(verifier.into());
        self
    }

    /// Build the EngineConfig, validating all parameters
    pub fn build(self) -> Result<EngineConfig, VerificationError> {
        let defaults = EngineConfig::default();

        let config = EngineConfig {
            cache_ttl_secs: self.cache_ttl_secs.unwrap_or(defaults.cache_ttl_secs),
            max_retries: self.max_retries.unwrap_or(defaults.max_retries),
            retry_base_delay_ms: self
                .retry_base_delay_ms
                .unwrap_or(defaults.retry_base_delay_ms),
            default_requests_per_second: self
                .default_requests_per_second
                .unwrap_or(defaults.default_requests_per_second),
            default_verifier: self.default_verifier.unwrap_or(defaults.default_verifier),
        };

        config.validate()?;
        Ok(config)
    }
}
