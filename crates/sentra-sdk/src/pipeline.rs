//! Transaction pipeline
//!
//! Control flow of one transaction: geo resolution, scoring (profile,
//! rules, ML, combine), persistence, then the consequences of the score
//! (device tracking, autonomous alert, audit) and finally the fire-and-
//! forget publish. Nothing is persisted before scoring completes; once the
//! record is persisted, later failures are logged and never surface.

use crate::error::{Result, SdkError};
use chrono::{DateTime, Utc};
use sentra_core::Transaction;
use sentra_runtime::audit::{AuditEntry, AuditSink};
use sentra_runtime::config::ConfigProvider;
use sentra_runtime::device::{DeviceObservation, DeviceTracker};
use sentra_runtime::event_bus::EventPublisher;
use sentra_runtime::geo::GeoResolver;
use sentra_runtime::ml::MlScoringClient;
use sentra_runtime::observability::{
    Metrics, MetricsCollector, ALERTS_CREATED, ML_FALLBACKS, POST_PERSIST_FAILURES,
    SCORING_LATENCY_MS, TRANSACTIONS_SCORED,
};
use sentra_runtime::response::{AlertCandidate, AutonomousResponder};
use sentra_runtime::rules::ScoringInput;
use sentra_runtime::scoring::{FraudScorer, ScoringOutcome};
use sentra_runtime::storage::TransactionStore;
use sentra_runtime::RuntimeError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Instant;

/// Default page size of [`TransactionPipeline::recent`]
pub const DEFAULT_RECENT_LIMIT: usize = 100;
pub const MAX_RECENT_LIMIT: usize = 1000;

fn default_currency() -> String {
    "USD".to_string()
}

/// Incoming transaction
///
/// A missing id is generated, a missing timestamp defaults to now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    #[serde(default)]
    pub transaction_id: Option<String>,
    pub user_id: String,
    pub amount: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub location: String,
    pub device_id: String,
    pub ip_address: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl TransactionRequest {
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(SdkError::InvalidRequest("userId must not be empty".to_string()));
        }
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(SdkError::InvalidRequest(format!(
                "amount must be positive, got {}",
                self.amount
            )));
        }
        if self.currency.chars().count() != 3 {
            return Err(SdkError::InvalidRequest(format!(
                "currency must be a 3-letter code, got '{}'",
                self.currency
            )));
        }
        if self.location.trim().chars().count() < 2 {
            return Err(SdkError::InvalidRequest(
                "location must have at least 2 characters".to_string(),
            ));
        }
        if self.device_id.trim().is_empty() {
            return Err(SdkError::InvalidRequest("deviceId must not be empty".to_string()));
        }
        if self.ip_address.parse::<IpAddr>().is_err() {
            return Err(SdkError::InvalidRequest(format!(
                "ipAddress '{}' is not a valid IP address",
                self.ip_address
            )));
        }
        if let Some(id) = &self.transaction_id {
            if id.trim().is_empty() {
                return Err(SdkError::InvalidRequest(
                    "transactionId must not be empty when given".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Transaction pipeline
///
/// Built by [`crate::PipelineBuilder`].
pub struct TransactionPipeline {
    pub(crate) geo: GeoResolver,
    pub(crate) scorer: FraudScorer,
    pub(crate) transactions: Arc<dyn TransactionStore>,
    pub(crate) responder: AutonomousResponder,
    pub(crate) devices: DeviceTracker,
    pub(crate) publisher: Arc<EventPublisher>,
    pub(crate) audit: Arc<dyn AuditSink>,
    pub(crate) ml: Arc<MlScoringClient>,
    pub(crate) config: Arc<dyn ConfigProvider>,
    pub(crate) metrics: Arc<MetricsCollector>,
}

impl TransactionPipeline {
    /// Score, persist and react to one transaction
    pub async fn create(&self, request: TransactionRequest) -> Result<Transaction> {
        request.validate()?;
        let started = Instant::now();

        let transaction_id = match &request.transaction_id {
            Some(id) => {
                if self.transactions.find_by_id(id).await?.is_some() {
                    return Err(duplicate_id(id));
                }
                id.clone()
            }
            None => uuid::Uuid::new_v4().to_string(),
        };
        let timestamp = request.timestamp.unwrap_or_else(Utc::now);

        let geo = self.geo.resolve(&request.ip_address, &request.location).await;
        let input = ScoringInput {
            user_id: request.user_id.clone(),
            amount: request.amount,
            location: request.location.clone(),
            device_id: request.device_id.clone(),
            ip_address: request.ip_address.clone(),
            latitude: geo.latitude,
            longitude: geo.longitude,
            timestamp,
        };
        let outcome = self.scorer.score(&input).await?;

        let transaction = scored_transaction(transaction_id, request, &input, geo, &outcome);
        // a concurrent request may have taken the id since the check above
        let created = self
            .transactions
            .create(transaction)
            .await
            .map_err(|e| match e {
                RuntimeError::DuplicateTransaction(id) => duplicate_id(&id),
                other => other.into(),
            })?;

        self.metrics.counter(TRANSACTIONS_SCORED).inc();
        if outcome.use_rule_fallback_only {
            self.metrics.counter(ML_FALLBACKS).inc();
        }

        self.apply_consequences(&created, &outcome).await;

        // the publisher counts its own failures
        if let Err(e) = self.publisher.publish_transaction_created(&created) {
            tracing::error!(
                "Failed to queue transaction {} for publishing: {}",
                created.transaction_id,
                e
            );
        }

        self.metrics
            .histogram(SCORING_LATENCY_MS)
            .observe_duration(started.elapsed());
        tracing::info!(
            "Transaction {} scored: fraud_score={} rule={} ml={:.3} tier={} action={} fallback={}",
            created.transaction_id,
            created.fraud_score,
            created.rule_score,
            created.ml_score,
            created.risk_level,
            created.action,
            outcome.use_rule_fallback_only
        );
        Ok(created)
    }

    /// Device tracking, autonomous alert and audit, run concurrently
    async fn apply_consequences(&self, created: &Transaction, outcome: &ScoringOutcome) {
        let observation = DeviceObservation {
            user_id: created.user_id.clone(),
            device_id: created.device_id.clone(),
            location: created.location.clone(),
            risk_level: created.risk_level,
            fraud_score: created.fraud_score,
            timestamp: created.timestamp,
        };
        let candidate = AlertCandidate {
            transaction_id: &created.transaction_id,
            user_id: &created.user_id,
            fraud_score: created.fraud_score,
            risk_level: created.risk_level,
            rule_reasons: &outcome.rule_reasons,
            explanations: &outcome.explanations,
        };
        let entry = AuditEntry::new("TRANSACTION_SCORED", "score", "transaction")
            .with_entity_id(created.transaction_id.clone())
            .with_metadata(json!({
                "userId": created.user_id,
                "action": created.action,
                "ruleScore": created.rule_score,
                "mlScore": created.ml_score,
                "fraudScore": created.fraud_score,
                "riskLevel": created.risk_level,
            }));

        let (device, alert, audit) = tokio::join!(
            self.devices.track(&observation),
            self.responder.process(candidate),
            self.audit.log(entry),
        );

        if let Err(e) = device {
            tracing::error!(
                "Device tracking failed for transaction {}: {}",
                created.transaction_id,
                e
            );
            self.metrics.counter(POST_PERSIST_FAILURES).inc();
        }
        match alert {
            Ok(Some(_)) => self.metrics.counter(ALERTS_CREATED).inc(),
            Ok(None) => {}
            Err(e) => {
                tracing::error!(
                    "Alert creation failed for transaction {}: {}",
                    created.transaction_id,
                    e
                );
                self.metrics.counter(POST_PERSIST_FAILURES).inc();
            }
        }
        if let Err(e) = audit {
            tracing::error!(
                "Audit failed for transaction {}: {}",
                created.transaction_id,
                e
            );
            self.metrics.counter(POST_PERSIST_FAILURES).inc();
        }
    }

    /// Most recent transactions, newest first
    pub async fn recent(&self, limit: usize) -> Result<Vec<Transaction>> {
        let limit = limit.clamp(1, MAX_RECENT_LIMIT);
        Ok(self.transactions.find_recent(limit).await?)
    }

    pub fn config_provider(&self) -> Arc<dyn ConfigProvider> {
        self.config.clone()
    }

    pub fn audit_sink(&self) -> Arc<dyn AuditSink> {
        self.audit.clone()
    }

    pub fn ml_client(&self) -> Arc<MlScoringClient> {
        self.ml.clone()
    }

    pub fn publisher(&self) -> Arc<EventPublisher> {
        self.publisher.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }
}

fn duplicate_id(transaction_id: &str) -> SdkError {
    SdkError::InvalidRequest(format!(
        "transactionId {} already exists",
        transaction_id
    ))
}

fn scored_transaction(
    transaction_id: String,
    request: TransactionRequest,
    input: &ScoringInput,
    geo: sentra_runtime::geo::ResolvedGeo,
    outcome: &ScoringOutcome,
) -> Transaction {
    Transaction {
        transaction_id,
        user_id: request.user_id,
        amount: request.amount,
        currency: request.currency,
        location: request.location,
        latitude: geo.latitude,
        longitude: geo.longitude,
        city: geo.city,
        country: geo.country,
        device_id: request.device_id,
        ip_address: request.ip_address,
        timestamp: input.timestamp,
        rule_score: outcome.rule_score,
        ml_score: outcome.ml_score,
        fraud_score: outcome.fraud_score,
        risk_level: outcome.risk_level,
        is_fraud: outcome.is_fraud,
        action: outcome.action,
        ml_status: outcome.ml_status,
        model_name: outcome.model_name.clone(),
        model_version: outcome.model_version.clone(),
        model_confidence: outcome.model_confidence,
        geo_velocity_flag: outcome.geo_velocity_flag,
        explanations: outcome.explanations.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> TransactionRequest {
        TransactionRequest {
            transaction_id: None,
            user_id: "user-1".to_string(),
            amount: 120.0,
            currency: "USD".to_string(),
            location: "NY".to_string(),
            device_id: "device-1".to_string(),
            ip_address: "203.0.113.10".to_string(),
            timestamp: None,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let mut req = request();
        req.amount = 0.0;
        assert!(matches!(req.validate(), Err(SdkError::InvalidRequest(_))));
        req.amount = f64::NAN;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_ip_and_currency() {
        let mut req = request();
        req.ip_address = "not-an-ip".to_string();
        assert!(req.validate().is_err());

        let mut req = request();
        req.currency = "DOLLARS".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_rejects_blank_user() {
        let mut req = request();
        req.user_id = "  ".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_request_defaults_from_json() {
        let req: TransactionRequest = serde_json::from_str(
            r#"{"userId": "u1", "amount": 10.5, "location": "NY", "deviceId": "d1", "ipAddress": "10.0.0.1"}"#,
        )
        .unwrap();
        assert_eq!(req.currency, "USD");
        assert!(req.transaction_id.is_none());
        assert!(req.timestamp.is_none());
    }
}
