//! Server configuration

use sentra_sdk::{PipelineConfig, RuntimeConfig};
use serde::{Deserialize, Serialize};

const MIN_GEO_CACHE_TTL_SECONDS: u64 = 60;
const MIN_CIRCUIT_FAIL_THRESHOLD: u32 = 1;
const MIN_CIRCUIT_RESET_SECONDS: u64 = 5;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Log level
    pub log_level: String,

    /// ML scorer base URL
    pub ml_service_url: String,

    /// Geo-IP base URL; unset resolves from the static location table only
    pub geoip_api_url: Option<String>,

    pub ml_timeout_ms: u64,

    pub geo_timeout_ms: u64,

    pub geo_cache_ttl_seconds: u64,

    pub ml_circuit_fail_threshold: u32,

    pub ml_circuit_reset_seconds: u64,

    pub model_name: String,

    pub model_version: String,

    /// Initial runtime settings, editable later through `PUT /v1/settings`
    pub runtime: RuntimeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let pipeline = PipelineConfig::default();
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            ml_service_url: pipeline.ml_service_url,
            geoip_api_url: pipeline.geoip_api_url,
            ml_timeout_ms: pipeline.ml_timeout_ms,
            geo_timeout_ms: pipeline.geo_timeout_ms,
            geo_cache_ttl_seconds: pipeline.geo_cache_ttl_seconds,
            ml_circuit_fail_threshold: pipeline.ml_circuit_fail_threshold,
            ml_circuit_reset_seconds: pipeline.ml_circuit_reset_seconds,
            model_name: pipeline.model_name,
            model_version: pipeline.model_version,
            runtime: pipeline.runtime,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `config/server` and `SENTRA_*` environment variables
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();

        let config_result = config::Config::builder()
            .add_source(config::File::with_name("config/server").required(false))
            .add_source(config::Environment::with_prefix("SENTRA"))
            .build();

        let config: Self = match config_result {
            Ok(cfg) => cfg
                .try_deserialize()
                .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e))?,
            Err(e) => {
                tracing::info!("No usable configuration ({}), using defaults", e);
                Self::default()
            }
        };

        Ok(config.clamped())
    }

    /// Raise values below their floors
    pub fn clamped(mut self) -> Self {
        self.geo_cache_ttl_seconds = self.geo_cache_ttl_seconds.max(MIN_GEO_CACHE_TTL_SECONDS);
        self.ml_circuit_fail_threshold =
            self.ml_circuit_fail_threshold.max(MIN_CIRCUIT_FAIL_THRESHOLD);
        self.ml_circuit_reset_seconds =
            self.ml_circuit_reset_seconds.max(MIN_CIRCUIT_RESET_SECONDS);
        self
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            ml_service_url: self.ml_service_url.clone(),
            geoip_api_url: self
                .geoip_api_url
                .clone()
                .filter(|url| !url.trim().is_empty()),
            ml_timeout_ms: self.ml_timeout_ms,
            geo_timeout_ms: self.geo_timeout_ms,
            geo_cache_ttl_seconds: self.geo_cache_ttl_seconds,
            ml_circuit_fail_threshold: self.ml_circuit_fail_threshold,
            ml_circuit_reset_seconds: self.ml_circuit_reset_seconds,
            model_name: self.model_name.clone(),
            model_version: self.model_version.clone(),
            runtime: self.runtime.clone(),
            ..PipelineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.ml_timeout_ms, 2500);
        assert_eq!(config.geo_cache_ttl_seconds, 86_400);
        assert_eq!(config.runtime, RuntimeConfig::default());
    }

    #[test]
    fn test_clamped_raises_floors() {
        let config = ServerConfig {
            geo_cache_ttl_seconds: 5,
            ml_circuit_fail_threshold: 0,
            ml_circuit_reset_seconds: 1,
            ..ServerConfig::default()
        }
        .clamped();

        assert_eq!(config.geo_cache_ttl_seconds, 60);
        assert_eq!(config.ml_circuit_fail_threshold, 1);
        assert_eq!(config.ml_circuit_reset_seconds, 5);
    }

    #[test]
    fn test_clamped_keeps_values_above_floors() {
        let config = ServerConfig::default().clamped();
        assert_eq!(config.geo_cache_ttl_seconds, 86_400);
        assert_eq!(config.ml_circuit_fail_threshold, 3);
        assert_eq!(config.ml_circuit_reset_seconds, 60);
    }

    #[test]
    fn test_to_pipeline_config() {
        let config = ServerConfig {
            ml_service_url: "http://ml:8000".to_string(),
            geoip_api_url: Some("  ".to_string()),
            ..ServerConfig::default()
        };

        let pipeline = config.to_pipeline_config();
        assert_eq!(pipeline.ml_service_url, "http://ml:8000");
        assert!(pipeline.geoip_api_url.is_none());
        assert_eq!(pipeline.fallback_alert_threshold, 80);
    }

    #[test]
    fn test_config_deserializes_partial_json() {
        let json = r#"{"port": 9090, "runtime": {"simulationMode": true}}"#;
        let config: ServerConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "127.0.0.1");
        assert!(config.runtime.simulation_mode);
        assert_eq!(config.runtime.score_rule_weight, 0.6);
    }
}
