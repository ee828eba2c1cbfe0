//! Audit sink
//!
//! Every pipeline decision with an operator-visible consequence leaves an
//! audit entry. Storage of the log belongs to an external collaborator.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

/// Who triggered an audited action
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditActor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

/// One audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub event_type: String,
    pub action: String,
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<AuditActor>,
    pub metadata: JsonValue,
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        event_type: impl Into<String>,
        action: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id: None,
            actor: None,
            metadata: JsonValue::Object(Default::default()),
            created_at: Utc::now(),
        }
    }

    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    pub fn with_actor(mut self, actor: Option<AuditActor>) -> Self {
        self.actor = actor;
        self
    }

    pub fn with_metadata(mut self, metadata: JsonValue) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Audit sink trait
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn log(&self, entry: AuditEntry) -> Result<()>;
}

/// Audit sink keeping entries in memory
pub struct InMemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Entries logged so far, oldest first
    pub async fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }

    /// Newest-first entries, capped at `limit`
    pub async fn list_recent(&self, limit: usize) -> Vec<AuditEntry> {
        self.entries
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditLog {
    async fn log(&self, entry: AuditEntry) -> Result<()> {
        tracing::debug!(
            "audit {} {} {} {:?}",
            entry.event_type,
            entry.action,
            entry.entity_type,
            entry.entity_id
        );
        self.entries.write().await.push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_log_and_list_recent() {
        let log = InMemoryAuditLog::new();
        for i in 0..3 {
            log.log(
                AuditEntry::new("TRANSACTION_SCORED", "score", "transaction")
                    .with_entity_id(format!("tx-{}", i))
                    .with_metadata(json!({ "fraudScore": i })),
            )
            .await
            .unwrap();
        }

        let recent = log.list_recent(2).await;
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].entity_id.as_deref(), Some("tx-2"));
        assert_eq!(log.entries().await.len(), 3);
    }
}
