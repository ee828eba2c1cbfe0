//! Storage interfaces consumed by the pipeline
//!
//! Durable persistence is owned by external collaborators. The pipeline
//! only needs the narrow read/write surface below; [`InMemoryStore`]
//! implements all of it for tests, development and simulation.

mod memory;

pub use memory::InMemoryStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sentra_core::{FraudAlert, Transaction, UserDevice, UserRiskProfile};

/// Transaction history store
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Transactions of `user_id` with `timestamp >= from`, newest first
    async fn find_by_user_within_window(
        &self,
        user_id: &str,
        from: DateTime<Utc>,
    ) -> Result<Vec<Transaction>>;

    /// Most recent transaction of `user_id`
    async fn find_latest_by_user(&self, user_id: &str) -> Result<Option<Transaction>>;

    async fn find_by_id(&self, transaction_id: &str) -> Result<Option<Transaction>>;

    /// Most recent transactions across all users, newest first
    async fn find_recent(&self, limit: usize) -> Result<Vec<Transaction>>;

    /// Persist a scored transaction
    ///
    /// Fails with `RuntimeError::DuplicateTransaction` if the id is taken.
    async fn create(&self, transaction: Transaction) -> Result<Transaction>;
}

/// Per-user profile store
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn upsert(&self, user_id: &str, profile: UserRiskProfile) -> Result<()>;

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<UserRiskProfile>>;
}

/// Per (user, device) fingerprint store
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn find_by_user_and_device(
        &self,
        user_id: &str,
        device_id: &str,
    ) -> Result<Option<UserDevice>>;

    async fn upsert(&self, device: UserDevice) -> Result<UserDevice>;
}

/// Alert store
#[async_trait]
pub trait AlertStore: Send + Sync {
    async fn create(&self, alert: FraudAlert) -> Result<FraudAlert>;
}
