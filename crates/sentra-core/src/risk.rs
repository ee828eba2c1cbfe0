//! Risk classification enums
//!
//! The combined score is mapped onto a [`RiskTier`] and a [`ResponseAction`]
//! by two independent exhaustive matches. Both mappings share the same band
//! edges, so a `High` tier always pairs with `Block`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Risk bucket derived from the combined fraud score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Classify a combined score (0-100)
    ///
    /// `<= 30` is Low, `31..=70` is Medium, anything above is High.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=30 => RiskTier::Low,
            31..=70 => RiskTier::Medium,
            _ => RiskTier::High,
        }
    }

    /// Whether this tier marks the transaction as fraudulent
    pub fn is_fraud(self) -> bool {
        matches!(self, RiskTier::High)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskTier::Low => "Low",
            RiskTier::Medium => "Medium",
            RiskTier::High => "High",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the caller should do with the payment attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseAction {
    Allow,
    StepUpAuth,
    Block,
}

impl ResponseAction {
    /// Map a combined score (0-100) to an action
    pub fn from_score(score: u8) -> Self {
        match score {
            71..=u8::MAX => ResponseAction::Block,
            31..=70 => ResponseAction::StepUpAuth,
            0..=30 => ResponseAction::Allow,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResponseAction::Allow => "ALLOW",
            ResponseAction::StepUpAuth => "STEP_UP_AUTH",
            ResponseAction::Block => "BLOCK",
        }
    }
}

impl fmt::Display for ResponseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health of the external ML scorer as seen by the circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MlHealth {
    Healthy,
    Degraded,
    Offline,
}

impl MlHealth {
    pub fn as_str(self) -> &'static str {
        match self {
            MlHealth::Healthy => "HEALTHY",
            MlHealth::Degraded => "DEGRADED",
            MlHealth::Offline => "OFFLINE",
        }
    }
}

impl fmt::Display for MlHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
