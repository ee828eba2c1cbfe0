//! User risk profile builder
//!
//! Computes rolling behavioral statistics from the last 24h and 7d of a
//! user's history and upserts them. Runs on the hot path of every
//! transaction, before the rule engine.

use crate::error::Result;
use crate::storage::{ProfileStore, TransactionStore};
use chrono::{DateTime, Duration, Utc};
use sentra_core::{Transaction, UserRiskProfile};
use std::collections::HashSet;
use std::sync::Arc;

/// Builds and stores [`UserRiskProfile`]s
pub struct ProfileBuilder {
    transactions: Arc<dyn TransactionStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl ProfileBuilder {
    pub fn new(transactions: Arc<dyn TransactionStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            transactions,
            profiles,
        }
    }

    /// Compute the profile as of `now`, persist it and return it
    pub async fn build_and_store(&self, user_id: &str, now: DateTime<Utc>) -> Result<UserRiskProfile> {
        let (day_history, week_history) = tokio::try_join!(
            self.transactions
                .find_by_user_within_window(user_id, now - Duration::hours(24)),
            self.transactions
                .find_by_user_within_window(user_id, now - Duration::days(7)),
        )?;

        let mut profile = compute_profile(&day_history, &week_history);
        profile.updated_at = Some(now);

        self.profiles.upsert(user_id, profile.clone()).await?;
        tracing::debug!(
            "profile for {}: avg={:.2} velocity={:.3} devices={} location_changes={:.2}",
            user_id,
            profile.avg_transaction_amount,
            profile.transaction_velocity,
            profile.device_count,
            profile.location_change_frequency
        );
        Ok(profile)
    }
}

/// Profile statistics over newest-first 24h and 7d histories
///
/// Location changes compare each entry with its predecessor in the given
/// (descending) order.
pub fn compute_profile(day_history: &[Transaction], week_history: &[Transaction]) -> UserRiskProfile {
    let avg_transaction_amount = if week_history.is_empty() {
        0.0
    } else {
        week_history.iter().map(|tx| tx.amount).sum::<f64>() / week_history.len() as f64
    };

    let transaction_velocity = day_history.len() as f64 / 24.0;

    let device_count = day_history
        .iter()
        .map(|tx| tx.device_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let location_change_frequency = if day_history.len() > 1 {
        let changes = day_history
            .windows(2)
            .filter(|pair| pair[0].location != pair[1].location)
            .count();
        changes as f64 / (day_history.len() - 1) as f64
    } else {
        0.0
    };

    UserRiskProfile {
        avg_transaction_amount,
        transaction_velocity,
        device_count,
        location_change_frequency,
        updated_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use crate::testing::transaction_at;

    fn tx(id: &str, hours_ago: i64, amount: f64, location: &str, device: &str) -> Transaction {
        let mut tx = transaction_at(id, "alice", Utc::now() - Duration::hours(hours_ago));
        tx.amount = amount;
        tx.location = location.to_string();
        tx.device_id = device.to_string();
        tx
    }

    #[test]
    fn test_empty_history() {
        let profile = compute_profile(&[], &[]);
        assert_eq!(profile.avg_transaction_amount, 0.0);
        assert_eq!(profile.transaction_velocity, 0.0);
        assert_eq!(profile.device_count, 0);
        assert_eq!(profile.location_change_frequency, 0.0);
    }

    #[test]
    fn test_single_record_has_no_location_changes() {
        let day = vec![tx("t1", 1, 50.0, "NY", "d1")];
        let profile = compute_profile(&day, &day);
        assert_eq!(profile.location_change_frequency, 0.0);
        assert_eq!(profile.device_count, 1);
    }

    #[test]
    fn test_statistics() {
        let day = vec![
            tx("t4", 1, 100.0, "NY", "d1"),
            tx("t3", 2, 200.0, "London", "d2"),
            tx("t2", 3, 300.0, "London", "d1"),
        ];
        let mut week = day.clone();
        week.push(tx("t1", 72, 400.0, "Tokyo", "d3"));

        let profile = compute_profile(&day, &week);
        assert_eq!(profile.avg_transaction_amount, 250.0);
        assert_eq!(profile.transaction_velocity, 3.0 / 24.0);
        assert_eq!(profile.device_count, 2);
        // NY->London changes, London->London does not
        assert_eq!(profile.location_change_frequency, 0.5);
    }

    #[tokio::test]
    async fn test_build_and_store_upserts() {
        let store = Arc::new(InMemoryStore::new());
        store
            .insert_transactions(vec![
                tx("t1", 1, 100.0, "NY", "d1"),
                tx("t2", 100, 300.0, "NY", "d1"),
            ])
            .await;

        let builder = ProfileBuilder::new(store.clone(), store.clone());
        let profile = builder.build_and_store("alice", Utc::now()).await.unwrap();
        assert_eq!(profile.avg_transaction_amount, 200.0);
        assert_eq!(profile.transaction_velocity, 1.0 / 24.0);

        let stored = store.find_by_user_id("alice").await.unwrap().unwrap();
        assert_eq!(stored, profile);
    }
}
