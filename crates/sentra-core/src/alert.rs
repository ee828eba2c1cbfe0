//! Fraud alert record

use crate::risk::RiskTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an alert
///
/// Only `Open` is produced by the pipeline; the other transitions belong
/// to case management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Open,
    Investigating,
    Resolved,
}

/// Alert created autonomously when a combined score crosses the threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudAlert {
    pub alert_id: String,
    pub transaction_id: String,
    pub user_id: String,
    pub fraud_score: u8,
    pub risk_level: RiskTier,
    /// Multi-line rationale
    pub reason: String,
    pub status: AlertStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
