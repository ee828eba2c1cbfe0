//! Transaction record

use crate::risk::{MlHealth, ResponseAction, RiskTier};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One feature-level explanation returned by the ML scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureExplanation {
    pub feature: String,
    /// Contribution in [0, 1]
    pub impact: f64,
    pub reason: String,
}

/// A latitude/longitude pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Immutable record of one scored payment attempt
///
/// Built once by the pipeline after scoring completes and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub transaction_id: String,
    pub user_id: String,
    pub amount: f64,
    pub currency: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    pub device_id: String,
    pub ip_address: String,
    pub timestamp: DateTime<Utc>,

    /// Rule engine score (0-100)
    pub rule_score: u8,
    /// Raw ML score (0-1), 0 under rule-only fallback
    pub ml_score: f64,
    /// Combined fraud score (0-100)
    pub fraud_score: u8,
    pub risk_level: RiskTier,
    pub is_fraud: bool,
    pub action: ResponseAction,
    pub ml_status: MlHealth,
    pub model_name: String,
    pub model_version: String,
    pub model_confidence: f64,
    #[serde(default)]
    pub geo_velocity_flag: bool,
    #[serde(default)]
    pub explanations: Vec<FeatureExplanation>,
}

impl Transaction {
    /// Coordinates, if both were resolved
    pub fn coordinates(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}
