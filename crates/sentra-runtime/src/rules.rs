//! Rule engine
//!
//! Additive scoring over the freshly built profile, the current
//! transaction and three independent history reads. Every rule is
//! evaluated (no early exit); each one that fires adds its points and one
//! human-readable reason. The total is clamped to 0-100.

use crate::config::ConfigProvider;
use crate::error::Result;
use crate::geo::haversine_km;
use crate::storage::TransactionStore;
use chrono::{DateTime, Duration, Utc};
use sentra_core::{GeoPoint, RuntimeConfig, Transaction, UserRiskProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

pub const AMOUNT_VS_AVERAGE_POINTS: u32 = 12;
pub const PROFILE_VELOCITY_POINTS: u32 = 8;
pub const LOCATION_CHURN_POINTS: u32 = 6;
pub const DEVICE_CHURN_POINTS: u32 = 5;
pub const HIGH_AMOUNT_POINTS: u32 = 40;
pub const WINDOW_VELOCITY_POINTS: u32 = 25;
pub const LOCATION_CHANGE_POINTS: u32 = 20;
pub const DEVICE_CHANGE_POINTS: u32 = 15;
pub const IP_CHANGE_POINTS: u32 = 10;
pub const GEO_VELOCITY_POINTS: u32 = 30;
pub const MULTI_DEVICE_POINTS: u32 = 10;

/// Distance beyond which travel inside [`GEO_VELOCITY_MAX_HOURS`] is implausible
pub const GEO_VELOCITY_MIN_KM: f64 = 1500.0;
pub const GEO_VELOCITY_MAX_HOURS: f64 = 2.0;

/// The transaction being scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringInput {
    pub user_id: String,
    pub amount: f64,
    pub location: String,
    pub device_id: String,
    pub ip_address: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl ScoringInput {
    fn coordinates(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }
}

/// Rule engine output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleEvaluation {
    /// Clamped score (0-100)
    pub score: u8,
    pub reasons: Vec<String>,
    pub geo_velocity_flag: bool,
}

/// History reads the window rules depend on
#[derive(Debug, Clone, Copy)]
pub struct RuleHistory<'a> {
    /// Stored transactions inside the configured velocity window
    pub velocity_window_count: usize,
    /// Most recent stored transaction of the user
    pub latest: Option<&'a Transaction>,
    /// Stored transactions of the last 24h
    pub day_history: &'a [Transaction],
}

/// Rule engine
pub struct RuleEngine {
    transactions: Arc<dyn TransactionStore>,
    config: Arc<dyn ConfigProvider>,
}

impl RuleEngine {
    pub fn new(transactions: Arc<dyn TransactionStore>, config: Arc<dyn ConfigProvider>) -> Self {
        Self {
            transactions,
            config,
        }
    }

    /// Score `input` against `profile` and the user's recent history
    pub async fn evaluate(
        &self,
        input: &ScoringInput,
        profile: &UserRiskProfile,
    ) -> Result<RuleEvaluation> {
        let config = self.config.runtime_config().await?;
        let window_from =
            input.timestamp - Duration::minutes(i64::from(config.velocity_window_minutes));
        let day_from = input.timestamp - Duration::hours(24);

        let (velocity_window, latest, day_history) = tokio::try_join!(
            self.transactions
                .find_by_user_within_window(&input.user_id, window_from),
            self.transactions.find_latest_by_user(&input.user_id),
            self.transactions
                .find_by_user_within_window(&input.user_id, day_from),
        )?;

        let history = RuleHistory {
            velocity_window_count: velocity_window.len(),
            latest: latest.as_ref(),
            day_history: &day_history,
        };
        let evaluation = score_rules(input, profile, &config, history);

        tracing::debug!(
            "rules for user {}: score={} fired={} geo_velocity={}",
            input.user_id,
            evaluation.score,
            evaluation.reasons.len(),
            evaluation.geo_velocity_flag
        );
        Ok(evaluation)
    }
}

/// Pure rule scoring
pub fn score_rules(
    input: &ScoringInput,
    profile: &UserRiskProfile,
    config: &RuntimeConfig,
    history: RuleHistory<'_>,
) -> RuleEvaluation {
    let mut score: u32 = 0;
    let mut reasons = Vec::new();
    let mut geo_velocity_flag = false;

    let avg = profile.avg_transaction_amount;
    if avg > 0.0 && input.amount > avg * 3.0 {
        score += AMOUNT_VS_AVERAGE_POINTS;
        reasons.push(format!(
            "Behavioral anomaly: amount {} is >3x user average {:.2}.",
            input.amount, avg
        ));
    }

    if profile.transaction_velocity >= 1.5 {
        score += PROFILE_VELOCITY_POINTS;
        reasons.push(format!(
            "Elevated user velocity profile ({:.2} tx/hour).",
            profile.transaction_velocity
        ));
    }

    if profile.location_change_frequency >= 0.6 {
        score += LOCATION_CHURN_POINTS;
        reasons.push(format!(
            "High location change frequency ({:.0}%).",
            profile.location_change_frequency * 100.0
        ));
    }

    if profile.device_count >= 5 {
        score += DEVICE_CHURN_POINTS;
        reasons.push(format!(
            "High device churn detected ({} devices in last 24h).",
            profile.device_count
        ));
    }

    if input.amount >= config.high_amount_threshold {
        score += HIGH_AMOUNT_POINTS;
        reasons.push(format!(
            "High transaction amount ({}) exceeds threshold {}.",
            input.amount, config.high_amount_threshold
        ));
    }

    if history.velocity_window_count >= config.velocity_tx_threshold as usize {
        score += WINDOW_VELOCITY_POINTS;
        reasons.push(format!(
            "High velocity detected ({} transactions in {} minutes).",
            history.velocity_window_count + 1,
            config.velocity_window_minutes
        ));
    }

    if let Some(latest) = history.latest {
        if latest.location != input.location {
            score += LOCATION_CHANGE_POINTS;
            reasons.push(format!(
                "Location anomaly: {} -> {}.",
                latest.location, input.location
            ));
        }

        if latest.device_id != input.device_id {
            score += DEVICE_CHANGE_POINTS;
            reasons.push(format!(
                "New device detected: previous {}, current {}.",
                latest.device_id, input.device_id
            ));
        }

        if latest.ip_address != input.ip_address {
            score += IP_CHANGE_POINTS;
            reasons.push(format!(
                "IP change detected: {} -> {}.",
                latest.ip_address, input.ip_address
            ));
        }

        if let (Some(previous), Some(current)) = (latest.coordinates(), input.coordinates()) {
            let hours = (input.timestamp - latest.timestamp).num_milliseconds().abs() as f64
                / 3_600_000.0;
            let distance = haversine_km(previous, current);
            if distance > GEO_VELOCITY_MIN_KM && hours < GEO_VELOCITY_MAX_HOURS {
                score += GEO_VELOCITY_POINTS;
                geo_velocity_flag = true;
                reasons.push(format!(
                    "Suspicious geo velocity detected ({}km in {:.2}h).",
                    distance.round(),
                    hours
                ));
            }
        }
    }

    let mut devices: HashSet<&str> = history
        .day_history
        .iter()
        .map(|tx| tx.device_id.as_str())
        .collect();
    devices.insert(input.device_id.as_str());
    if devices.len() >= 3 {
        score += MULTI_DEVICE_POINTS;
        reasons.push(format!(
            "Multiple devices used in 24h ({} unique devices).",
            devices.len()
        ));
    }

    RuleEvaluation {
        score: score.min(100) as u8,
        reasons,
        geo_velocity_flag,
    }
}
