//! Operator settings
//!
//! The only writer of the runtime configuration. Updates are merged,
//! validated and stored one at a time; the scorer sees them on its next
//! read.

use crate::error::Result;
use sentra_core::{RuntimeConfig, RuntimeConfigPatch};
use sentra_runtime::audit::{AuditActor, AuditEntry, AuditSink};
use sentra_runtime::config::ConfigProvider;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct SettingsService {
    config: Arc<dyn ConfigProvider>,
    audit: Arc<dyn AuditSink>,
    write_lock: Mutex<()>,
}

impl SettingsService {
    pub fn new(config: Arc<dyn ConfigProvider>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            config,
            audit,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn get(&self) -> Result<RuntimeConfig> {
        Ok(self.config.runtime_config().await?)
    }

    /// Merge `patch` into the current settings
    ///
    /// An update that breaks the weight invariant is rejected and nothing
    /// is stored.
    pub async fn update(
        &self,
        patch: RuntimeConfigPatch,
        actor: Option<AuditActor>,
    ) -> Result<RuntimeConfig> {
        let _guard = self.write_lock.lock().await;

        let current = self.config.runtime_config().await?;
        let next = current.apply(&patch)?;
        self.config.store(next.clone()).await?;

        tracing::info!(
            "Settings updated: rule_weight={} ml_weight={} alert_threshold={} simulation_mode={}",
            next.score_rule_weight,
            next.score_ml_weight,
            next.autonomous_alert_threshold,
            next.simulation_mode
        );

        let entry = AuditEntry::new("SETTINGS_UPDATED", "update", "settings")
            .with_entity_id("runtime")
            .with_actor(actor)
            .with_metadata(serde_json::to_value(&patch).unwrap_or_default());
        if let Err(e) = self.audit.log(entry).await {
            tracing::error!("Failed to audit settings update: {}", e);
        }

        Ok(next)
    }
}
