//! REST API type definitions

use sentra_sdk::{
    SettingsService, SimulationService, SystemHealthService, Transaction, TransactionPipeline,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<TransactionPipeline>,
    pub settings: Arc<SettingsService>,
    pub simulation: Arc<SimulationService>,
    pub health: Arc<SystemHealthService>,
}

impl AppState {
    /// Derive the settings, simulation and health services from one pipeline
    pub fn new(pipeline: Arc<TransactionPipeline>) -> Self {
        let settings = SettingsService::new(pipeline.config_provider(), pipeline.audit_sink());
        let simulation = SimulationService::new(pipeline.clone());
        let health = SystemHealthService::new(pipeline.ml_client());

        Self {
            pipeline,
            settings: Arc::new(settings),
            simulation: Arc::new(simulation),
            health: Arc::new(health),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `GET /v1/transactions` query
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TransactionListResponse {
    pub count: usize,
    pub transactions: Vec<Transaction>,
}

/// `POST /v1/simulation/start` body; may be omitted
#[derive(Debug, Default, Deserialize)]
pub struct SimulationStartPayload {
    #[serde(default)]
    pub count: Option<usize>,
}
