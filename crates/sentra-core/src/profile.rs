//! Per-user behavioral profile

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolling behavioral statistics for one user
///
/// Overwritten (not appended) after every transaction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRiskProfile {
    /// Mean amount over the last 7 days
    pub avg_transaction_amount: f64,
    /// Transactions in the last 24h divided by 24
    pub transaction_velocity: f64,
    /// Distinct devices in the last 24h
    pub device_count: usize,
    /// Fraction of adjacent 24h transactions whose location changed
    pub location_change_frequency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
