//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Service name stamped on every log line
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error) or a full directive
    pub log_level: String,

    /// Whether to enable console output
    pub console_output: bool,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Deployment environment (dev, staging, prod)
    pub environment: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "authenticity-engine".to_string(),
            log_level: "info".to_string(),
            console_output: true,
            json_logs: false,
            environment: "dev".to_string(),
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AV_SERVICE_NAME`: Service name (default: authenticity-engine)
    /// - `AV_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `AV_CONSOLE_OUTPUT`: Enable console output (default: true)
    /// - `AV_JSON_LOGS`: Enable JSON logs (default: false in dev, true in containers)
    /// - `AV_ENVIRONMENT`: Environment name (default: dev)
    pub fn from_env() -> Self {
        let is_container =
            env::var("KUBERNETES_SERVICE_HOST").is_ok() || env::var("DOCKER_CONTAINER").is_ok();

        Self {
            service_name: env::var("AV_SERVICE_NAME")
                .unwrap_or_else(|_| "authenticity-engine".to_string()),

            log_level: env::var("AV_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            console_output: env::var("AV_CONSOLE_OUTPUT")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(true),

            json_logs: env::var("AV_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(is_container),

            environment: env::var("AV_ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()),
        }
    }

    /// Service name qualified by environment, e.g. `authenticity-engine-prod`.
    pub fn full_service_name(&self) -> String {
        if self.environment == "dev" {
            self.service_name.clone()
        } else {
            format!("{}-{}", self.service_name, self.environment)
        }
    }
}
