//! Operator-tunable runtime configuration
//!
//! Read fresh on every scoring call. The ensemble weights must sum to 1
//! within [`WEIGHT_TOLERANCE`]; the check happens when an update is
//! applied, never while scoring.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Allowed deviation of `score_rule_weight + score_ml_weight` from 1
pub const WEIGHT_TOLERANCE: f64 = 0.001;

/// Runtime thresholds and ensemble weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Amount at or above which the high-amount rule fires
    #[serde(default = "default_high_amount_threshold")]
    pub high_amount_threshold: f64,

    /// Length of the velocity window in minutes
    #[serde(default = "default_velocity_window_minutes")]
    pub velocity_window_minutes: u32,

    /// Stored transactions in the window at which the velocity rule fires
    #[serde(default = "default_velocity_tx_threshold")]
    pub velocity_tx_threshold: u32,

    #[serde(default = "default_rule_weight")]
    pub score_rule_weight: f64,

    #[serde(default = "default_ml_weight")]
    pub score_ml_weight: f64,

    /// Combined score at or above which an alert is raised
    #[serde(default = "default_alert_threshold")]
    pub autonomous_alert_threshold: u8,

    #[serde(default)]
    pub simulation_mode: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            high_amount_threshold: default_high_amount_threshold(),
            velocity_window_minutes: default_velocity_window_minutes(),
            velocity_tx_threshold: default_velocity_tx_threshold(),
            score_rule_weight: default_rule_weight(),
            score_ml_weight: default_ml_weight(),
            autonomous_alert_threshold: default_alert_threshold(),
            simulation_mode: false,
        }
    }
}

impl RuntimeConfig {
    /// Check the weight invariant
    pub fn validate(&self) -> Result<()> {
        let weights = [self.score_rule_weight, self.score_ml_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(CoreError::InvalidConfig(
                "score weights must be finite and non-negative".to_string(),
            ));
        }
        if (self.score_rule_weight + self.score_ml_weight - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(CoreError::InvalidConfig(
                "scoreRuleWeight + scoreMlWeight must equal 1".to_string(),
            ));
        }
        if !self.high_amount_threshold.is_finite() || self.high_amount_threshold < 0.0 {
            return Err(CoreError::InvalidConfig(
                "highAmountThreshold must be a non-negative number".to_string(),
            ));
        }
        if self.autonomous_alert_threshold > 100 {
            return Err(CoreError::InvalidConfig(
                "autonomousAlertThreshold must be within 0-100".to_string(),
            ));
        }
        Ok(())
    }

    /// Merge a partial update and validate the result
    ///
    /// `self` is left untouched; the merged value is returned only if it
    /// satisfies the weight invariant.
    pub fn apply(&self, patch: &RuntimeConfigPatch) -> Result<RuntimeConfig> {
        let mut next = self.clone();
        if let Some(v) = patch.high_amount_threshold {
            next.high_amount_threshold = v;
        }
        if let Some(v) = patch.velocity_window_minutes {
            next.velocity_window_minutes = v;
        }
        if let Some(v) = patch.velocity_tx_threshold {
            next.velocity_tx_threshold = v;
        }
        if let Some(v) = patch.score_rule_weight {
            next.score_rule_weight = v;
        }
        if let Some(v) = patch.score_ml_weight {
            next.score_ml_weight = v;
        }
        if let Some(v) = patch.autonomous_alert_threshold {
            next.autonomous_alert_threshold = v;
        }
        if let Some(v) = patch.simulation_mode {
            next.simulation_mode = v;
        }
        next.validate()?;
        Ok(next)
    }
}

/// Partial update of [`RuntimeConfig`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub high_amount_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_window_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_tx_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_rule_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_ml_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autonomous_alert_threshold: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulation_mode: Option<bool>,
}

fn default_high_amount_threshold() -> f64 {
    5000.0
}

fn default_velocity_window_minutes() -> u32 {
    5
}

fn default_velocity_tx_threshold() -> u32 {
    5
}

fn default_rule_weight() -> f64 {
    0.6
}

fn default_ml_weight() -> f64 {
    0.4
}

fn default_alert_threshold() -> u8 {
    80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RuntimeConfig::default();
        assert_eq!(config.high_amount_threshold, 5000.0);
        assert_eq!(config.velocity_window_minutes, 5);
        assert_eq!(config.autonomous_alert_threshold, 80);
        assert!(!config.simulation_mode);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_weights_within_tolerance() {
        let patch = RuntimeConfigPatch {
            score_rule_weight: Some(0.7),
            score_ml_weight: Some(0.3005),
            ..Default::default()
        };
        let next = RuntimeConfig::default().apply(&patch).unwrap();
        assert_eq!(next.score_rule_weight, 0.7);
    }

    #[test]
    fn test_weights_outside_tolerance_rejected() {
        let patch = RuntimeConfigPatch {
            score_rule_weight: Some(0.7),
            ..Default::default()
        };
        let err = RuntimeConfig::default().apply(&patch).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConfig(_)));
        assert!(err.to_string().contains("must equal 1"));
    }

    #[test]
    fn test_apply_keeps_unpatched_fields() {
        let patch = RuntimeConfigPatch {
            simulation_mode: Some(true),
            high_amount_threshold: Some(1000.0),
            ..Default::default()
        };
        let next = RuntimeConfig::default().apply(&patch).unwrap();
        assert!(next.simulation_mode);
        assert_eq!(next.high_amount_threshold, 1000.0);
        assert_eq!(next.velocity_tx_threshold, 5);
        assert_eq!(next.score_ml_weight, 0.4);
    }

    #[test]
    fn test_deserialize_camel_case_with_defaults() {
        let config: RuntimeConfig =
            serde_json::from_str(r#"{"highAmountThreshold": 2500, "simulationMode": true}"#)
                .unwrap();
        assert_eq!(config.high_amount_threshold, 2500.0);
        assert!(config.simulation_mode);
        assert_eq!(config.score_rule_weight, 0.6);
    }
}
