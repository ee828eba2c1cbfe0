//! Configuration types for the transaction pipeline

use sentra_core::RuntimeConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wiring configuration
///
/// Operator-tunable values live in [`RuntimeConfig`]; everything else here
/// is fixed for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// ML scorer base URL, used when no scorer is injected
    pub ml_service_url: String,

    /// Geo-IP base URL; `None` resolves from the static table only
    pub geoip_api_url: Option<String>,

    pub ml_timeout_ms: u64,

    pub geo_timeout_ms: u64,

    pub geo_cache_ttl_seconds: u64,

    /// Consecutive ML failures before the circuit opens
    pub ml_circuit_fail_threshold: u32,

    pub ml_circuit_reset_seconds: u64,

    pub model_name: String,

    pub model_version: String,

    /// Alert threshold when the runtime config cannot be read
    pub fallback_alert_threshold: u8,

    /// Initial runtime configuration
    pub runtime: RuntimeConfig,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ml_timeout(&self) -> Duration {
        Duration::from_millis(self.ml_timeout_ms)
    }

    pub fn geo_timeout(&self) -> Duration {
        Duration::from_millis(self.geo_timeout_ms)
    }

    pub fn geo_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.geo_cache_ttl_seconds)
    }

    pub fn ml_circuit_reset(&self) -> Duration {
        Duration::from_secs(self.ml_circuit_reset_seconds)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ml_service_url: "http://localhost:8000".to_string(),
            geoip_api_url: Some("https://ipwho.is".to_string()),
            ml_timeout_ms: 2500,
            geo_timeout_ms: 1500,
            geo_cache_ttl_seconds: 86_400,
            ml_circuit_fail_threshold: 3,
            ml_circuit_reset_seconds: 60,
            model_name: "IsolationForest-Fraud-v1".to_string(),
            model_version: "1.0.0".to_string(),
            fallback_alert_threshold: 80,
            runtime: RuntimeConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.ml_timeout(), Duration::from_millis(2500));
        assert_eq!(config.geo_timeout(), Duration::from_millis(1500));
        assert_eq!(config.geo_cache_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.ml_circuit_fail_threshold, 3);
        assert_eq!(config.model_name, "IsolationForest-Fraud-v1");
        assert_eq!(config.runtime, RuntimeConfig::default());
    }

    #[test]
    fn test_partial_deserialize_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"ml_service_url": "http://ml:9000", "geoip_api_url": null}"#)
                .unwrap();
        assert_eq!(config.ml_service_url, "http://ml:9000");
        assert!(config.geoip_api_url.is_none());
        assert_eq!(config.ml_timeout_ms, 2500);
    }
}
