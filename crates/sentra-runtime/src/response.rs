//! Autonomous response
//!
//! The only path that creates fraud alerts for transactions. An alert is a
//! pure consequence of the combined score reaching the configured
//! threshold; the rationale lists every rule reason and ML explanation.

use crate::audit::{AuditEntry, AuditSink};
use crate::config::ConfigProvider;
use crate::error::Result;
use crate::event_bus::EventPublisher;
use crate::storage::AlertStore;
use chrono::Utc;
use sentra_core::{AlertStatus, FeatureExplanation, FraudAlert, RiskTier};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

/// Threshold used when the runtime config cannot be read
pub const DEFAULT_ALERT_THRESHOLD: u8 = 80;

const NO_SIGNALS: &str =
    "No explicit signals available; high aggregate risk score triggered autonomous response.";

/// Scored transaction handed to the responder
#[derive(Debug, Clone, Copy)]
pub struct AlertCandidate<'a> {
    pub transaction_id: &'a str,
    pub user_id: &'a str,
    pub fraud_score: u8,
    pub risk_level: RiskTier,
    pub rule_reasons: &'a [String],
    pub explanations: &'a [FeatureExplanation],
}

/// Build the alert rationale
///
/// First line states score and threshold, then one numbered line per rule
/// reason followed by one per ML explanation. Repeated lines are kept once.
pub fn compose_reason(
    fraud_score: u8,
    threshold: u8,
    rule_reasons: &[String],
    explanations: &[FeatureExplanation],
) -> String {
    let mut lines: Vec<String> = rule_reasons
        .iter()
        .map(|reason| format!("Rule: {}", reason))
        .chain(
            explanations
                .iter()
                .map(|item| format!("ML({}): {}", item.feature, item.reason)),
        )
        .collect();
    if lines.is_empty() {
        lines.push(NO_SIGNALS.to_string());
    }

    let mut seen = HashSet::new();
    lines.retain(|line| seen.insert(line.clone()));

    let detail = lines
        .iter()
        .enumerate()
        .map(|(index, line)| format!("{}. {}", index + 1, line))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Autonomous response triggered at score {} (threshold {}).\n{}",
        fraud_score, threshold, detail
    )
}

/// Autonomous responder
pub struct AutonomousResponder {
    alerts: Arc<dyn AlertStore>,
    publisher: Arc<EventPublisher>,
    audit: Arc<dyn AuditSink>,
    config: Arc<dyn ConfigProvider>,
    fallback_threshold: u8,
}

impl AutonomousResponder {
    pub fn new(
        alerts: Arc<dyn AlertStore>,
        publisher: Arc<EventPublisher>,
        audit: Arc<dyn AuditSink>,
        config: Arc<dyn ConfigProvider>,
    ) -> Self {
        Self {
            alerts,
            publisher,
            audit,
            config,
            fallback_threshold: DEFAULT_ALERT_THRESHOLD,
        }
    }

    pub fn with_fallback_threshold(mut self, threshold: u8) -> Self {
        self.fallback_threshold = threshold;
        self
    }

    async fn threshold(&self) -> u8 {
        match self.config.runtime_config().await {
            Ok(config) => config.autonomous_alert_threshold,
            Err(e) => {
                tracing::warn!(
                    "Runtime config unavailable, alert threshold falls back to {}: {}",
                    self.fallback_threshold,
                    e
                );
                self.fallback_threshold
            }
        }
    }

    /// Create an alert if the score reaches the threshold
    ///
    /// Returns `None` below the threshold. A failed alert write is returned
    /// as an error; audit and publish failures are only logged.
    pub async fn process(&self, candidate: AlertCandidate<'_>) -> Result<Option<FraudAlert>> {
        let threshold = self.threshold().await;
        if candidate.fraud_score < threshold {
            return Ok(None);
        }

        let now = Utc::now();
        let alert = FraudAlert {
            alert_id: uuid::Uuid::new_v4().to_string(),
            transaction_id: candidate.transaction_id.to_string(),
            user_id: candidate.user_id.to_string(),
            fraud_score: candidate.fraud_score,
            risk_level: candidate.risk_level,
            reason: compose_reason(
                candidate.fraud_score,
                threshold,
                candidate.rule_reasons,
                candidate.explanations,
            ),
            status: AlertStatus::Open,
            created_at: now,
            updated_at: now,
        };
        let alert = self.alerts.create(alert).await?;
        tracing::info!(
            "Fraud alert {} created for transaction {} at score {}",
            alert.alert_id,
            alert.transaction_id,
            alert.fraud_score
        );

        let entry = AuditEntry::new("ALERT_GENERATED", "create", "fraud_alert")
            .with_entity_id(alert.alert_id.clone())
            .with_metadata(json!({
                "transactionId": alert.transaction_id,
                "userId": alert.user_id,
                "fraudScore": alert.fraud_score,
                "riskLevel": alert.risk_level,
            }));
        if let Err(e) = self.audit.log(entry).await {
            tracing::error!("Failed to audit alert {}: {}", alert.alert_id, e);
        }
        if let Err(e) = self.publisher.publish_fraud_alert(&alert) {
            tracing::error!("Failed to publish alert {}: {}", alert.alert_id, e);
        }

        Ok(Some(alert))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditLog;
    use crate::config::InMemoryConfigProvider;
    use crate::error::RuntimeError;
    use crate::event_bus::{Channel, InMemoryEventBus};
    use crate::storage::InMemoryStore;
    use async_trait::async_trait;
    use sentra_core::RuntimeConfig;
    use std::time::Duration;

    struct UnreadableConfig;

    #[async_trait]
    impl ConfigProvider for UnreadableConfig {
        async fn runtime_config(&self) -> Result<RuntimeConfig> {
            Err(RuntimeError::Storage("settings unavailable".to_string()))
        }

        async fn store(&self, _config: RuntimeConfig) -> Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        store: Arc<InMemoryStore>,
        audit: Arc<InMemoryAuditLog>,
        bus: Arc<InMemoryEventBus>,
        responder: AutonomousResponder,
    }

    fn fixture(config: Arc<dyn ConfigProvider>) -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let audit = Arc::new(InMemoryAuditLog::new());
        let bus = Arc::new(InMemoryEventBus::default());
        let publisher = Arc::new(EventPublisher::new(bus.clone()));
        let responder = AutonomousResponder::new(store.clone(), publisher, audit.clone(), config);
        Fixture {
            store,
            audit,
            bus,
            responder,
        }
    }

    fn candidate<'a>(score: u8, reasons: &'a [String], explanations: &'a [FeatureExplanation]) -> AlertCandidate<'a> {
        AlertCandidate {
            transaction_id: "tx-1",
            user_id: "user-1",
            fraud_score: score,
            risk_level: RiskTier::from_score(score),
            rule_reasons: reasons,
            explanations,
        }
    }

    #[test]
    fn test_compose_reason_numbering() {
        let reasons = vec![
            "High transaction amount (6000) exceeds threshold 5000.".to_string(),
            "New device detected: previous device-1, current device-2.".to_string(),
        ];
        let explanations = vec![FeatureExplanation {
            feature: "amount".to_string(),
            impact: 0.5,
            reason: "amount far above median".to_string(),
        }];

        let reason = compose_reason(85, 80, &reasons, &explanations);
        assert_eq!(
            reason,
            "Autonomous response triggered at score 85 (threshold 80).\n\
             1. Rule: High transaction amount (6000) exceeds threshold 5000.\n\
             2. Rule: New device detected: previous device-1, current device-2.\n\
             3. ML(amount): amount far above median"
        );
    }

    #[test]
    fn test_compose_reason_deduplicates() {
        let reasons = vec!["same".to_string(), "same".to_string()];
        let reason = compose_reason(90, 80, &reasons, &[]);
        assert!(reason.ends_with("\n1. Rule: same"));
    }

    #[test]
    fn test_compose_reason_without_signals() {
        let reason = compose_reason(90, 80, &[], &[]);
        assert_eq!(
            reason,
            format!(
                "Autonomous response triggered at score 90 (threshold 80).\n1. {}",
                NO_SIGNALS
            )
        );
    }

    #[tokio::test]
    async fn test_below_threshold_creates_nothing() {
        let fixture = fixture(Arc::new(InMemoryConfigProvider::default()));
        let result = fixture.responder.process(candidate(79, &[], &[])).await.unwrap();
        assert!(result.is_none());
        assert!(fixture.store.alerts().await.is_empty());
        assert!(fixture.audit.entries().await.is_empty());
    }

    #[tokio::test]
    async fn test_at_threshold_creates_alert() {
        let fixture = fixture(Arc::new(InMemoryConfigProvider::default()));
        let mut alerts = fixture.bus.subscribe(Channel::FraudAlerts);
        let reasons = vec!["High velocity detected (6 transactions in 5 minutes).".to_string()];

        let alert = fixture
            .responder
            .process(candidate(80, &reasons, &[]))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(alert.status, AlertStatus::Open);
        assert_eq!(alert.fraud_score, 80);
        assert!(alert.reason.contains("threshold 80"));
        assert_eq!(fixture.store.alerts().await.len(), 1);

        let entries = fixture.audit.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].event_type, "ALERT_GENERATED");
        assert_eq!(entries[0].entity_type, "fraud_alert");
        assert_eq!(entries[0].entity_id.as_deref(), Some(alert.alert_id.as_str()));

        let published = tokio::time::timeout(Duration::from_secs(1), alerts.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(published.contains(&alert.alert_id));
    }

    #[tokio::test]
    async fn test_threshold_follows_runtime_config() {
        let config = RuntimeConfig {
            autonomous_alert_threshold: 60,
            ..RuntimeConfig::default()
        };
        let fixture = fixture(Arc::new(InMemoryConfigProvider::new(config)));
        let alert = fixture.responder.process(candidate(65, &[], &[])).await.unwrap();
        assert!(alert.unwrap().reason.contains("(threshold 60)"));
    }

    #[tokio::test]
    async fn test_unreadable_config_uses_fallback_threshold() {
        let fixture = fixture(Arc::new(UnreadableConfig));
        assert!(fixture
            .responder
            .process(candidate(79, &[], &[]))
            .await
            .unwrap()
            .is_none());
        assert!(fixture
            .responder
            .process(candidate(80, &[], &[]))
            .await
            .unwrap()
            .is_some());
    }
}
