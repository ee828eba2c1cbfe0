//! In-memory store
//!
//! Keeps every record in process memory behind `tokio::sync::RwLock`s.
//! Data is lost when the process restarts.

use super::{AlertStore, DeviceStore, ProfileStore, TransactionStore};
use crate::error::{Result, RuntimeError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentra_core::{FraudAlert, Transaction, UserDevice, UserRiskProfile};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory implementation of every pipeline store
pub struct InMemoryStore {
    transactions: RwLock<Vec<Transaction>>,
    profiles: RwLock<HashMap<String, UserRiskProfile>>,
    /// Keyed by (user_id, device_id)
    devices: RwLock<HashMap<(String, String), UserDevice>>,
    alerts: RwLock<Vec<FraudAlert>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            transactions: RwLock::new(Vec::new()),
            profiles: RwLock::new(HashMap::new()),
            devices: RwLock::new(HashMap::new()),
            alerts: RwLock::new(Vec::new()),
        }
    }

    /// Seed history without going through the pipeline
    pub async fn insert_transactions(&self, transactions: impl IntoIterator<Item = Transaction>) {
        self.transactions.write().await.extend(transactions);
    }

    /// All alerts created so far, oldest first
    pub async fn alerts(&self) -> Vec<FraudAlert> {
        self.alerts.read().await.clone()
    }

    pub async fn transaction_count(&self) -> usize {
        self.transactions.read().await.len()
    }

    /// Newest-first copy of the transactions matching `predicate`
    async fn newest_first<F>(&self, predicate: F) -> Vec<Transaction>
    where
        F: Fn(&Transaction) -> bool,
    {
        let transactions = self.transactions.read().await;
        // Reverse insertion order first so equal timestamps keep "latest written first"
        let mut matching: Vec<Transaction> = transactions
            .iter()
            .rev()
            .filter(|tx| predicate(tx))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        matching
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionStore for InMemoryStore {
    async fn find_by_user_within_window(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
    ) -> Result<Vec<Transaction>> {
        Ok(self
            .newest_first(|tx| tx.user_id == user_id && tx.timestamp >= from)
            .await)
    }

    async fn find_latest_by_user(&self, user_id: &str) -> Result<Option<Transaction>> {
        Ok(self
            .newest_first(|tx| tx.user_id == user_id)
            .await
            .into_iter()
            .next())
    }

    async fn find_by_id(&self, transaction_id: &str) -> Result<Option<Transaction>> {
        let transactions = self.transactions.read().await;
        Ok(transactions
            .iter()
            .find(|tx| tx.transaction_id == transaction_id)
            .cloned())
    }

    async fn find_recent(&self, limit: usize) -> Result<Vec<Transaction>> {
        let mut recent = self.newest_first(|_| true).await;
        recent.truncate(limit);
        Ok(recent)
    }

    async fn create(&self, transaction: Transaction) -> Result<Transaction> {
        let mut transactions = self.transactions.write().await;
        if transactions
            .iter()
            .any(|tx| tx.transaction_id == transaction.transaction_id)
        {
            return Err(RuntimeError::DuplicateTransaction(
                transaction.transaction_id,
            ));
        }
        transactions.push(transaction.clone());
        Ok(transaction)
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn upsert(&self, user_id: &str, profile: UserRiskProfile) -> Result<()> {
        self.profiles
            .write()
            .await
            .insert(user_id.to_string(), profile);
        Ok(())
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<UserRiskProfile>> {
        Ok(self.profiles.read().await.get(user_id).cloned())
    }
}

#[async_trait]
impl DeviceStore for InMemoryStore {
    async fn find_by_user_and_device(
        &self,
        user_id: &str,
        device_id: &str,
    ) -> Result<Option<UserDevice>> {
        let key = (user_id.to_string(), device_id.to_string());
        Ok(self.devices.read().await.get(&key).cloned())
    }

    async fn upsert(&self, device: UserDevice) -> Result<UserDevice> {
        let key = (device.user_id.clone(), device.device_id.clone());
        self.devices.write().await.insert(key, device.clone());
        Ok(device)
    }
}

#[async_trait]
impl AlertStore for InMemoryStore {
    async fn create(&self, alert: FraudAlert) -> Result<FraudAlert> {
        self.alerts.write().await.push(alert.clone());
        Ok(alert)
    }
}
