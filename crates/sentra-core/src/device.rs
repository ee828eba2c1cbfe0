//! Per (user, device) fingerprint record

use crate::risk::RiskTier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDevice {
    pub user_id: String,
    pub device_id: String,
    /// Location of the most recent transaction from this device
    pub location: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub tx_count: u64,
    /// Sticky: once set it is never cleared by the tracker
    pub is_suspicious: bool,
    pub risk_level: RiskTier,
}
