//! Fraud scoring combiner
//!
//! Runs the per-transaction decision path (profile, rules, ML) and merges
//! the rule score with the ML probability into the final 0-100 score. Any
//! ML failure, circuit-open refusal included, degrades to rule-only scoring.

use crate::config::ConfigProvider;
use crate::error::Result;
use crate::ml::{MlScoringClient, PredictRequest};
use crate::profile::ProfileBuilder;
use crate::rules::{RuleEngine, ScoringInput};
use sentra_core::{FeatureExplanation, MlHealth, ResponseAction, RiskTier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Final score with its classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedScore {
    pub fraud_score: u8,
    pub risk_level: RiskTier,
    pub is_fraud: bool,
    pub action: ResponseAction,
    pub model_confidence: f64,
}

/// Merge the rule score with an optional ML probability
///
/// `None` means the ML call failed: the rule score is used unchanged.
pub fn combine(
    rule_score: u8,
    ml_score: Option<f64>,
    rule_weight: f64,
    ml_weight: f64,
) -> CombinedScore {
    let (fraud_score, model_confidence) = match ml_score {
        None => (rule_score.min(100), f64::from(rule_score) / 100.0),
        Some(ml) => {
            let weighted = f64::from(rule_score) * rule_weight + ml * 100.0 * ml_weight;
            (weighted.round().clamp(0.0, 100.0) as u8, ml.clamp(0.0, 1.0))
        }
    };

    let risk_level = RiskTier::from_score(fraud_score);
    CombinedScore {
        fraud_score,
        risk_level,
        is_fraud: risk_level.is_fraud(),
        action: ResponseAction::from_score(fraud_score),
        model_confidence,
    }
}

/// Everything the pipeline needs to persist a scored transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringOutcome {
    pub fraud_score: u8,
    pub risk_level: RiskTier,
    pub is_fraud: bool,
    pub action: ResponseAction,
    pub rule_score: u8,
    pub ml_score: f64,
    pub ml_status: MlHealth,
    pub model_name: String,
    pub model_version: String,
    pub model_confidence: f64,
    pub explanations: Vec<FeatureExplanation>,
    pub rule_reasons: Vec<String>,
    pub geo_velocity_flag: bool,
    pub use_rule_fallback_only: bool,
}

/// Fraud scorer
pub struct FraudScorer {
    profiles: ProfileBuilder,
    rules: RuleEngine,
    ml: Arc<MlScoringClient>,
    config: Arc<dyn ConfigProvider>,
}

impl FraudScorer {
    pub fn new(
        profiles: ProfileBuilder,
        rules: RuleEngine,
        ml: Arc<MlScoringClient>,
        config: Arc<dyn ConfigProvider>,
    ) -> Self {
        Self {
            profiles,
            rules,
            ml,
            config,
        }
    }

    /// Score one transaction
    ///
    /// History and config reads propagate their errors; ML errors do not.
    pub async fn score(&self, input: &ScoringInput) -> Result<ScoringOutcome> {
        let profile = self
            .profiles
            .build_and_store(&input.user_id, input.timestamp)
            .await?;
        let evaluation = self.rules.evaluate(input, &profile).await?;
        let config = self.config.runtime_config().await?;

        let request = PredictRequest {
            user_id: input.user_id.clone(),
            amount: input.amount,
            location: input.location.clone(),
            device_id: input.device_id.clone(),
            timestamp: input.timestamp,
        };
        let (ml_score, explanations) = match self.ml.score(&request).await {
            Ok(prediction) => (Some(prediction.fraud_score), prediction.explanations),
            Err(e) => {
                tracing::warn!(
                    "ML scoring unavailable for user {}, using rule score only: {}",
                    input.user_id,
                    e
                );
                (None, Vec::new())
            }
        };

        let combined = combine(
            evaluation.score,
            ml_score,
            config.score_rule_weight,
            config.score_ml_weight,
        );
        let model = self.ml.model_info();

        Ok(ScoringOutcome {
            fraud_score: combined.fraud_score,
            risk_level: combined.risk_level,
            is_fraud: combined.is_fraud,
            action: combined.action,
            rule_score: evaluation.score,
            ml_score: ml_score.unwrap_or(0.0),
            ml_status: model.ml_status,
            model_name: model.model_name,
            model_version: model.model_version,
            model_confidence: combined.model_confidence,
            explanations,
            rule_reasons: evaluation.reasons,
            geo_velocity_flag: evaluation.geo_velocity_flag,
            use_rule_fallback_only: ml_score.is_none(),
        })
    }
}
