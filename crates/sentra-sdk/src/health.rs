//! System health report

use chrono::{DateTime, Utc};
use sentra_runtime::ml::{CircuitSnapshot, MlScoringClient, ModelInfo};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub timestamp: DateTime<Utc>,
    /// Result of the ML liveness probe
    pub ml_status: ComponentStatus,
    pub ml_latency_ms: u64,
    /// Circuit breaker view, independent of the probe
    pub ml_circuit: CircuitSnapshot,
    pub model: ModelInfo,
}

pub struct SystemHealthService {
    ml: Arc<MlScoringClient>,
}

impl SystemHealthService {
    pub fn new(ml: Arc<MlScoringClient>) -> Self {
        Self { ml }
    }

    pub async fn report(&self) -> SystemHealth {
        let started = Instant::now();
        let (ml_status, ml_latency_ms) = match self.ml.health_check().await {
            Ok(()) => (ComponentStatus::Up, started.elapsed().as_millis() as u64),
            Err(e) => {
                tracing::warn!("ML health probe failed: {}", e);
                (ComponentStatus::Down, 0)
            }
        };

        SystemHealth {
            timestamp: Utc::now(),
            ml_status,
            ml_latency_ms,
            ml_circuit: self.ml.status(),
            model: self.ml.model_info(),
        }
    }
}
