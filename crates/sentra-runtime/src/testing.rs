//! Shared fixtures for unit tests

use chrono::{DateTime, Utc};
use sentra_core::{MlHealth, ResponseAction, RiskTier, Transaction};

/// A low-risk stored transaction with placeholder attributes
pub(crate) fn transaction_at(id: &str, user_id: &str, timestamp: DateTime<Utc>) -> Transaction {
    Transaction {
        transaction_id: id.to_string(),
        user_id: user_id.to_string(),
        amount: 100.0,
        currency: "USD".to_string(),
        location: "NY".to_string(),
        latitude: None,
        longitude: None,
        city: None,
        country: None,
        device_id: "device-1".to_string(),
        ip_address: "203.0.113.10".to_string(),
        timestamp,
        rule_score: 0,
        ml_score: 0.0,
        fraud_score: 0,
        risk_level: RiskTier::Low,
        is_fraud: false,
        action: ResponseAction::Allow,
        ml_status: MlHealth::Healthy,
        model_name: "test-model".to_string(),
        model_version: "0.0.1".to_string(),
        model_confidence: 0.0,
        geo_velocity_flag: false,
        explanations: Vec::new(),
    }
}
