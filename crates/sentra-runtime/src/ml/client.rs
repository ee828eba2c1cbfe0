//! ML scoring client: deadline and circuit breaker around an [`MlScorer`]

use super::breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot};
use super::scorer::{MlPrediction, MlScorer, PredictRequest};
use crate::error::{Result, RuntimeError};
use chrono::Utc;
use sentra_core::MlHealth;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Default deadline for one prediction
pub const DEFAULT_ML_TIMEOUT: Duration = Duration::from_millis(2500);

/// Identity of the deployed model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub model_name: String,
    pub model_version: String,
    pub ml_status: MlHealth,
    pub last_latency_ms: u64,
}

pub struct MlScoringClient {
    scorer: Arc<dyn MlScorer>,
    breaker: CircuitBreaker,
    timeout: Duration,
    model_name: String,
    model_version: String,
}

impl MlScoringClient {
    pub fn new(scorer: Arc<dyn MlScorer>, breaker: CircuitBreakerConfig) -> Self {
        Self {
            scorer,
            breaker: CircuitBreaker::new(breaker),
            timeout: DEFAULT_ML_TIMEOUT,
            model_name: "IsolationForest-Fraud-v1".to_string(),
            model_version: "1.0.0".to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_model(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.model_name = name.into();
        self.model_version = version.into();
        self
    }

    /// Score one transaction
    ///
    /// Fails fast with [`RuntimeError::CircuitOpen`] while the circuit is
    /// open. Every attempted call reports its outcome to the breaker.
    pub async fn score(&self, request: &PredictRequest) -> Result<MlPrediction> {
        self.breaker
            .try_acquire(Utc::now())
            .map_err(RuntimeError::CircuitOpen)?;

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.timeout, self.scorer.predict(request)).await;

        match outcome {
            Ok(Ok(mut prediction)) => {
                if !prediction.fraud_score.is_finite() {
                    let reason = format!("ML returned invalid score {}", prediction.fraud_score);
                    self.breaker.record_failure(reason.clone(), Utc::now());
                    return Err(RuntimeError::ExternalCallFailed(reason));
                }
                prediction.fraud_score = prediction.fraud_score.clamp(0.0, 1.0);
                self.breaker.record_success(started.elapsed());
                Ok(prediction)
            }
            Ok(Err(e)) => {
                self.breaker.record_failure(e.to_string(), Utc::now());
                Err(e)
            }
            Err(_) => {
                let millis = self.timeout.as_millis() as u64;
                self.breaker
                    .record_failure(format!("timeout of {}ms exceeded", millis), Utc::now());
                Err(RuntimeError::Timeout(millis))
            }
        }
    }

    /// Probe the scorer's liveness without touching the breaker
    pub async fn health_check(&self) -> Result<()> {
        match tokio::time::timeout(self.timeout, self.scorer.health()).await {
            Ok(result) => result,
            Err(_) => Err(RuntimeError::Timeout(self.timeout.as_millis() as u64)),
        }
    }

    pub fn status(&self) -> CircuitSnapshot {
        self.breaker.snapshot()
    }

    pub fn health(&self) -> MlHealth {
        self.breaker.status()
    }

    pub fn model_info(&self) -> ModelInfo {
        let snapshot = self.breaker.snapshot();
        ModelInfo {
            model_name: self.model_name.clone(),
            model_version: self.model_version.clone(),
            ml_status: snapshot.status,
            last_latency_ms: snapshot.last_latency_ms,
        }
    }
}
