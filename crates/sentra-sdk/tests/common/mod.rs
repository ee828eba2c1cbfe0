//! Common test utilities for SDK integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentra_core::{MlHealth, ResponseAction, RiskTier, RuntimeConfig, Transaction};
use sentra_runtime::ml::{MlPrediction, MlScorer, PredictRequest};
use sentra_runtime::{
    InMemoryAuditLog, InMemoryConfigProvider, InMemoryEventBus, InMemoryStore, Result,
    RuntimeError,
};
use sentra_sdk::{PipelineBuilder, PipelineConfig, TransactionPipeline, TransactionRequest};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// ML scorer whose answer can be changed between transactions
pub struct StubScorer {
    score: Mutex<Option<f64>>,
    calls: AtomicUsize,
}

impl StubScorer {
    /// `None` makes every prediction fail
    pub fn new(score: Option<f64>) -> Arc<Self> {
        Arc::new(Self {
            score: Mutex::new(score),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set(&self, score: Option<f64>) {
        *self.score.lock().unwrap() = score;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MlScorer for StubScorer {
    async fn predict(&self, _request: &PredictRequest) -> Result<MlPrediction> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let score = *self.score.lock().unwrap();
        match score {
            Some(score) => Ok(MlPrediction {
                fraud_score: score,
                is_fraud: score > 0.5,
                explanations: vec![],
            }),
            None => Err(RuntimeError::ExternalCallFailed(
                "connection refused".to_string(),
            )),
        }
    }

    async fn health(&self) -> Result<()> {
        match *self.score.lock().unwrap() {
            Some(_) => Ok(()),
            None => Err(RuntimeError::ExternalCallFailed("down".to_string())),
        }
    }
}

/// A pipeline wired to in-memory collaborators the test can inspect
pub struct TestPipeline {
    pub pipeline: Arc<TransactionPipeline>,
    pub store: Arc<InMemoryStore>,
    pub bus: Arc<InMemoryEventBus>,
    pub audit: Arc<InMemoryAuditLog>,
    pub config: Arc<InMemoryConfigProvider>,
    pub scorer: Arc<StubScorer>,
}

impl TestPipeline {
    pub fn new(ml_score: Option<f64>) -> Self {
        Self::with_runtime(ml_score, RuntimeConfig::default())
    }

    pub fn with_runtime(ml_score: Option<f64>, runtime: RuntimeConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let bus = Arc::new(InMemoryEventBus::default());
        let audit = Arc::new(InMemoryAuditLog::new());
        let config = Arc::new(InMemoryConfigProvider::new(runtime.clone()));
        let scorer = StubScorer::new(ml_score);

        let pipeline = PipelineBuilder::new()
            .with_config(PipelineConfig {
                geoip_api_url: None,
                runtime,
                ..PipelineConfig::default()
            })
            .with_store(store.clone())
            .with_event_bus(bus.clone())
            .with_audit_sink(audit.clone())
            .with_config_provider(config.clone())
            .with_ml_scorer(scorer.clone())
            .build()
            .expect("pipeline builds");

        Self {
            pipeline: Arc::new(pipeline),
            store,
            bus,
            audit,
            config,
            scorer,
        }
    }
}

pub fn request(user_id: &str, amount: f64) -> TransactionRequest {
    TransactionRequest {
        transaction_id: None,
        user_id: user_id.to_string(),
        amount,
        currency: "USD".to_string(),
        location: "NY".to_string(),
        device_id: "device-1".to_string(),
        ip_address: "10.0.0.5".to_string(),
        timestamp: None,
    }
}

/// A previously scored, low-risk transaction
pub fn stored_transaction(id: &str, user_id: &str, timestamp: DateTime<Utc>) -> Transaction {
    Transaction {
        transaction_id: id.to_string(),
        user_id: user_id.to_string(),
        amount: 100.0,
        currency: "USD".to_string(),
        location: "NY".to_string(),
        latitude: None,
        longitude: None,
        city: None,
        country: None,
        device_id: "device-1".to_string(),
        ip_address: "10.0.0.5".to_string(),
        timestamp,
        rule_score: 0,
        ml_score: 0.1,
        fraud_score: 4,
        risk_level: RiskTier::Low,
        is_fraud: false,
        action: ResponseAction::Allow,
        ml_status: MlHealth::Healthy,
        model_name: "IsolationForest-Fraud-v1".to_string(),
        model_version: "1.0.0".to_string(),
        model_confidence: 0.1,
        geo_velocity_flag: false,
        explanations: vec![],
    }
}
