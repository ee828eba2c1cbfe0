//! Runtime configuration provider
//!
//! Scoring components hold a `ConfigProvider` and ask it for the current
//! [`RuntimeConfig`] on every call, so operator changes apply to the next
//! transaction without a restart.

use crate::error::Result;
use async_trait::async_trait;
use sentra_core::RuntimeConfig;
use tokio::sync::RwLock;

/// Source of the current runtime configuration
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Current configuration
    async fn runtime_config(&self) -> Result<RuntimeConfig>;

    /// Replace the configuration
    ///
    /// Callers validate before storing; providers store what they are given.
    async fn store(&self, config: RuntimeConfig) -> Result<()>;
}

/// Configuration provider backed by process memory
pub struct InMemoryConfigProvider {
    config: RwLock<RuntimeConfig>,
}

impl InMemoryConfigProvider {
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

impl Default for InMemoryConfigProvider {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

#[async_trait]
impl ConfigProvider for InMemoryConfigProvider {
    async fn runtime_config(&self) -> Result<RuntimeConfig> {
        Ok(self.config.read().await.clone())
    }

    async fn store(&self, config: RuntimeConfig) -> Result<()> {
        *self.config.write().await = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_is_visible_to_next_read() {
        let provider = InMemoryConfigProvider::default();
        let mut config = provider.runtime_config().await.unwrap();
        config.high_amount_threshold = 42.0;
        provider.store(config).await.unwrap();

        assert_eq!(
            provider.runtime_config().await.unwrap().high_amount_threshold,
            42.0
        );
    }
}
