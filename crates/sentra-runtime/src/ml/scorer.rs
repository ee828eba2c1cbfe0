//! ML scorer collaborator

use crate::error::{Result, RuntimeError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentra_core::FeatureExplanation;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Body of `POST /predict`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub user_id: String,
    pub amount: f64,
    pub location: String,
    pub device_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Answer of `POST /predict`
///
/// `fraud_score` is a probability in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MlPrediction {
    pub fraud_score: f64,
    #[serde(default)]
    pub is_fraud: bool,
    #[serde(default)]
    pub explanations: Vec<FeatureExplanation>,
}

/// ML scoring trait
#[async_trait]
pub trait MlScorer: Send + Sync {
    async fn predict(&self, request: &PredictRequest) -> Result<MlPrediction>;

    /// Liveness probe
    async fn health(&self) -> Result<()>;
}

/// ML scorer over HTTP
pub struct HttpMlScorer {
    base_url: String,
    client: reqwest::Client,
}

impl HttpMlScorer {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                RuntimeError::ExternalCallFailed(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl MlScorer for HttpMlScorer {
    async fn predict(&self, request: &PredictRequest) -> Result<MlPrediction> {
        let url = format!("{}/predict", self.base_url);
        tracing::debug!("Calling ML scorer for user {}", request.user_id);

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| RuntimeError::ExternalCallFailed(format!("ML predict failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RuntimeError::ExternalCallFailed(format!(
                "ML predict failed with status: {}",
                response.status()
            )));
        }

        response.json::<MlPrediction>().await.map_err(|e| {
            RuntimeError::ExternalCallFailed(format!("Failed to parse ML response: {}", e))
        })
    }

    async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RuntimeError::ExternalCallFailed(format!("ML health failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RuntimeError::ExternalCallFailed(format!(
                "ML health failed with status: {}",
                response.status()
            )));
        }
        Ok(())
    }
}
