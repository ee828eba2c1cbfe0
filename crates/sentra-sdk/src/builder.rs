//! Builder pattern for TransactionPipeline

use crate::config::PipelineConfig;
use crate::error::{Result, SdkError};
use crate::pipeline::TransactionPipeline;
use sentra_runtime::audit::{AuditSink, InMemoryAuditLog};
use sentra_runtime::config::{ConfigProvider, InMemoryConfigProvider};
use sentra_runtime::device::DeviceTracker;
use sentra_runtime::event_bus::{EventBus, EventPublisher, InMemoryEventBus};
use sentra_runtime::geo::{GeoCache, GeoLookup, GeoResolver, HttpGeoLookup};
use sentra_runtime::ml::{CircuitBreakerConfig, HttpMlScorer, MlScorer, MlScoringClient};
use sentra_runtime::observability::{Metrics, MetricsCollector, PUBLISH_FAILURES};
use sentra_runtime::profile::ProfileBuilder;
use sentra_runtime::response::AutonomousResponder;
use sentra_runtime::rules::RuleEngine;
use sentra_runtime::scoring::FraudScorer;
use sentra_runtime::storage::{
    AlertStore, DeviceStore, InMemoryStore, ProfileStore, TransactionStore,
};
use std::sync::Arc;

/// Builder for TransactionPipeline
///
/// Every collaborator can be injected; anything left unset is backed by a
/// shared [`InMemoryStore`], an in-process bus and audit log, and HTTP
/// clients built from [`PipelineConfig`].
///
/// # Example
///
/// ```rust,ignore
/// use sentra_sdk::{PipelineBuilder, PipelineConfig};
///
/// let pipeline = PipelineBuilder::new()
///     .with_config(PipelineConfig::default())
///     .with_event_bus(bus)
///     .build()?;
/// ```
#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    transactions: Option<Arc<dyn TransactionStore>>,
    profiles: Option<Arc<dyn ProfileStore>>,
    devices: Option<Arc<dyn DeviceStore>>,
    alerts: Option<Arc<dyn AlertStore>>,
    ml_scorer: Option<Arc<dyn MlScorer>>,
    geo_lookup: Option<Arc<dyn GeoLookup>>,
    event_bus: Option<Arc<dyn EventBus>>,
    audit: Option<Arc<dyn AuditSink>>,
    config_provider: Option<Arc<dyn ConfigProvider>>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Use one store for transactions, profiles, devices and alerts
    pub fn with_store(mut self, store: Arc<InMemoryStore>) -> Self {
        self.transactions = Some(store.clone());
        self.profiles = Some(store.clone());
        self.devices = Some(store.clone());
        self.alerts = Some(store);
        self
    }

    pub fn with_transaction_store(mut self, store: Arc<dyn TransactionStore>) -> Self {
        self.transactions = Some(store);
        self
    }

    pub fn with_profile_store(mut self, store: Arc<dyn ProfileStore>) -> Self {
        self.profiles = Some(store);
        self
    }

    pub fn with_device_store(mut self, store: Arc<dyn DeviceStore>) -> Self {
        self.devices = Some(store);
        self
    }

    pub fn with_alert_store(mut self, store: Arc<dyn AlertStore>) -> Self {
        self.alerts = Some(store);
        self
    }

    /// Replace the HTTP ML scorer
    pub fn with_ml_scorer(mut self, scorer: Arc<dyn MlScorer>) -> Self {
        self.ml_scorer = Some(scorer);
        self
    }

    /// Replace the HTTP geo-IP lookup
    pub fn with_geo_lookup(mut self, lookup: Arc<dyn GeoLookup>) -> Self {
        self.geo_lookup = Some(lookup);
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<dyn EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn with_config_provider(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.config_provider = Some(provider);
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the pipeline
    ///
    /// Must be called inside a tokio runtime: the event publisher spawns
    /// its delivery task here.
    pub fn build(self) -> Result<TransactionPipeline> {
        let config = self.config;
        config.runtime.validate()?;

        if config.fallback_alert_threshold > 100 {
            return Err(SdkError::ConfigError(format!(
                "fallback alert threshold {} is above 100",
                config.fallback_alert_threshold
            )));
        }

        let fallback = Arc::new(InMemoryStore::new());
        let transactions = self.transactions.unwrap_or_else(|| fallback.clone());
        let profiles = self.profiles.unwrap_or_else(|| fallback.clone());
        let devices = self.devices.unwrap_or_else(|| fallback.clone());
        let alerts = self.alerts.unwrap_or_else(|| fallback.clone());

        let config_provider = self
            .config_provider
            .unwrap_or_else(|| Arc::new(InMemoryConfigProvider::new(config.runtime.clone())));
        let audit = self
            .audit
            .unwrap_or_else(|| Arc::new(InMemoryAuditLog::new()));
        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(MetricsCollector::for_pipeline()));

        let ml_scorer = match self.ml_scorer {
            Some(scorer) => scorer,
            None => {
                tracing::info!("Using ML scorer at {}", config.ml_service_url);
                Arc::new(HttpMlScorer::new(&config.ml_service_url, config.ml_timeout())?)
            }
        };
        let ml = Arc::new(
            MlScoringClient::new(
                ml_scorer,
                CircuitBreakerConfig {
                    failure_threshold: config.ml_circuit_fail_threshold,
                    reset_window: config.ml_circuit_reset(),
                },
            )
            .with_timeout(config.ml_timeout())
            .with_model(&config.model_name, &config.model_version),
        );

        let geo_lookup = match (self.geo_lookup, &config.geoip_api_url) {
            (Some(lookup), _) => Some(lookup),
            (None, Some(url)) => {
                let lookup: Arc<dyn GeoLookup> =
                    Arc::new(HttpGeoLookup::new(url, config.geo_timeout())?);
                Some(lookup)
            }
            (None, None) => None,
        };
        let geo = match geo_lookup {
            Some(lookup) => GeoResolver::new(lookup, GeoCache::new(config.geo_cache_ttl()))
                .with_timeout(config.geo_timeout()),
            None => {
                tracing::info!("No geo-IP service configured, resolving from location table");
                GeoResolver::offline()
            }
        };

        let bus = self
            .event_bus
            .unwrap_or_else(|| Arc::new(InMemoryEventBus::default()));
        let publisher = Arc::new(EventPublisher::with_failure_counter(
            bus,
            metrics.counter(PUBLISH_FAILURES),
        ));

        let scorer = FraudScorer::new(
            ProfileBuilder::new(transactions.clone(), profiles),
            RuleEngine::new(transactions.clone(), config_provider.clone()),
            ml.clone(),
            config_provider.clone(),
        );
        let responder = AutonomousResponder::new(
            alerts,
            publisher.clone(),
            audit.clone(),
            config_provider.clone(),
        )
        .with_fallback_threshold(config.fallback_alert_threshold);

        Ok(TransactionPipeline {
            geo,
            scorer,
            transactions,
            responder,
            devices: DeviceTracker::new(devices),
            publisher,
            audit,
            ml,
            config: config_provider,
            metrics,
        })
    }
}
