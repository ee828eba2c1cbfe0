//! Device fingerprint tracker

use crate::error::Result;
use crate::storage::DeviceStore;
use chrono::{DateTime, Utc};
use sentra_core::{RiskTier, UserDevice};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Score at which a device is marked suspicious regardless of tier
pub const SUSPICIOUS_SCORE: u8 = 75;

/// One scored transaction seen from a (user, device) pair
#[derive(Debug, Clone)]
pub struct DeviceObservation {
    pub user_id: String,
    pub device_id: String,
    pub location: String,
    pub risk_level: RiskTier,
    pub fraud_score: u8,
    pub timestamp: DateTime<Utc>,
}

/// Lock stripes guarding the read-modify-write of a (user, device) pair
const LOCK_STRIPES: usize = 64;

/// Tracks (user, device) pairs
///
/// Updates for the same pair are serialized through a striped lock, so
/// concurrent transactions in one process never lose a `tx_count`
/// increment. Trackers in separate processes sharing a store are not
/// coordinated.
pub struct DeviceTracker {
    devices: Arc<dyn DeviceStore>,
    stripes: Vec<Mutex<()>>,
}

impl DeviceTracker {
    pub fn new(devices: Arc<dyn DeviceStore>) -> Self {
        Self {
            devices,
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    fn stripe(&self, user_id: &str, device_id: &str) -> &Mutex<()> {
        let mut hasher = DefaultHasher::new();
        (user_id, device_id).hash(&mut hasher);
        &self.stripes[(hasher.finish() as usize) % self.stripes.len()]
    }

    /// Record the observation and return the updated device
    ///
    /// A new pair is always suspicious. Suspicion is never cleared and a
    /// High tier is never downgraded.
    pub async fn track(&self, observation: &DeviceObservation) -> Result<UserDevice> {
        let _guard = self
            .stripe(&observation.user_id, &observation.device_id)
            .lock()
            .await;

        let prior = self
            .devices
            .find_by_user_and_device(&observation.user_id, &observation.device_id)
            .await?;

        let by_novelty = prior.is_none();
        let by_risk =
            observation.risk_level == RiskTier::High || observation.fraud_score >= SUSPICIOUS_SCORE;
        let was_suspicious = prior.as_ref().is_some_and(|device| device.is_suspicious);
        let was_high = prior
            .as_ref()
            .is_some_and(|device| device.risk_level == RiskTier::High);

        let device = UserDevice {
            user_id: observation.user_id.clone(),
            device_id: observation.device_id.clone(),
            location: observation.location.clone(),
            first_seen: prior
                .as_ref()
                .map(|device| device.first_seen)
                .unwrap_or(observation.timestamp),
            last_seen: observation.timestamp,
            tx_count: prior
                .as_ref()
                .map(|device| device.tx_count)
                .unwrap_or(0)
                .saturating_add(1),
            is_suspicious: was_suspicious || by_novelty || by_risk,
            risk_level: if by_risk || was_high {
                RiskTier::High
            } else {
                observation.risk_level
            },
        };

        if by_novelty {
            tracing::info!(
                "New device {} for user {}",
                observation.device_id,
                observation.user_id
            );
        }
        self.devices.upsert(device).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use async_trait::async_trait;
    use chrono::Duration;

    /// Device store that yields between the read and the write
    struct YieldingStore(InMemoryStore);

    #[async_trait]
    impl DeviceStore for YieldingStore {
        async fn find_by_user_and_device(
            &self,
            user_id: &str,
            device_id: &str,
        ) -> Result<Option<UserDevice>> {
            let found = DeviceStore::find_by_user_and_device(&self.0, user_id, device_id).await?;
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            Ok(found)
        }

        async fn upsert(&self, device: UserDevice) -> Result<UserDevice> {
            DeviceStore::upsert(&self.0, device).await
        }
    }

    fn observation(tier: RiskTier, score: u8, timestamp: DateTime<Utc>) -> DeviceObservation {
        DeviceObservation {
            user_id: "user-1".to_string(),
            device_id: "device-1".to_string(),
            location: "NY".to_string(),
            risk_level: tier,
            fraud_score: score,
            timestamp,
        }
    }

    #[tokio::test]
    async fn test_first_sighting_is_suspicious() {
        let tracker = DeviceTracker::new(Arc::new(InMemoryStore::new()));
        let now = Utc::now();
        let device = tracker
            .track(&observation(RiskTier::Low, 10, now))
            .await
            .unwrap();

        assert!(device.is_suspicious);
        assert_eq!(device.risk_level, RiskTier::Low);
        assert_eq!(device.tx_count, 1);
        assert_eq!(device.first_seen, now);
    }

    #[tokio::test]
    async fn test_suspicion_is_sticky() {
        let tracker = DeviceTracker::new(Arc::new(InMemoryStore::new()));
        let first = Utc::now();
        let later = first + Duration::minutes(10);

        tracker
            .track(&observation(RiskTier::Low, 10, first))
            .await
            .unwrap();
        let device = tracker
            .track(&observation(RiskTier::Low, 10, later))
            .await
            .unwrap();

        assert!(device.is_suspicious);
        assert_eq!(device.first_seen, first);
        assert_eq!(device.last_seen, later);
        assert_eq!(device.tx_count, 2);
    }

    #[tokio::test]
    async fn test_high_score_marks_high_tier() {
        let tracker = DeviceTracker::new(Arc::new(InMemoryStore::new()));
        let device = tracker
            .track(&observation(RiskTier::Medium, 75, Utc::now()))
            .await
            .unwrap();
        assert_eq!(device.risk_level, RiskTier::High);
    }

    #[tokio::test]
    async fn test_high_tier_is_not_downgraded() {
        let tracker = DeviceTracker::new(Arc::new(InMemoryStore::new()));
        tracker
            .track(&observation(RiskTier::High, 90, Utc::now()))
            .await
            .unwrap();
        let device = tracker
            .track(&observation(RiskTier::Low, 5, Utc::now()))
            .await
            .unwrap();
        assert_eq!(device.risk_level, RiskTier::High);
        assert!(device.is_suspicious);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_tracking_keeps_every_increment() {
        let store = Arc::new(YieldingStore(InMemoryStore::new()));
        let tracker = Arc::new(DeviceTracker::new(store.clone()));
        let first = Utc::now();

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let tracker = tracker.clone();
                tokio::spawn(async move {
                    tracker
                        .track(&observation(
                            RiskTier::Low,
                            10,
                            first + Duration::seconds(i),
                        ))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let device = store
            .find_by_user_and_device("user-1", "device-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(device.tx_count, 20);
    }
}
