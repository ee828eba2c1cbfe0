//! Synthetic traffic generator
//!
//! Feeds generated transactions through the normal pipeline so dashboards
//! and alerts can be exercised without real traffic. Only runs while
//! `simulation_mode` is enabled in the runtime settings.

use crate::error::{Result, SdkError};
use crate::pipeline::{TransactionPipeline, TransactionRequest};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use sentra_runtime::geo::SAMPLE_LOCATIONS;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

pub const DEFAULT_SIMULATION_COUNT: usize = 50;
pub const MAX_SIMULATION_COUNT: usize = 500;

const SIMULATED_USERS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub generated: usize,
}

/// Build `count` synthetic requests, newest first, one second apart
///
/// Every 6th amount is a large one, every 5th device is unknown.
pub fn generate_requests<R: Rng + ?Sized>(
    count: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<TransactionRequest> {
    (0..count)
        .map(|i| {
            let amount: u32 = if i % 6 == 0 {
                rng.gen_range(50_000..=110_000)
            } else {
                rng.gen_range(20..=5_020)
            };
            let location = SAMPLE_LOCATIONS[rng.gen_range(0..SAMPLE_LOCATIONS.len())];
            let device_id = if i % 5 == 0 {
                let suffix = uuid::Uuid::new_v4().simple().to_string();
                format!("unknown-{}", &suffix[..6])
            } else {
                format!("device-{}", (i % 20) + 1)
            };

            TransactionRequest {
                transaction_id: Some(format!("sim-{}", uuid::Uuid::new_v4())),
                user_id: format!("sim-user-{}", (i % SIMULATED_USERS) + 1),
                amount: f64::from(amount),
                currency: "USD".to_string(),
                location: location.to_string(),
                device_id,
                ip_address: format!("10.0.{}.{}", (i % 10) + 1, (i % 200) + 1),
                timestamp: Some(now - Duration::seconds(i as i64)),
            }
        })
        .collect()
}

pub struct SimulationService {
    pipeline: Arc<TransactionPipeline>,
}

impl SimulationService {
    pub fn new(pipeline: Arc<TransactionPipeline>) -> Self {
        Self { pipeline }
    }

    /// Generate and score `count` transactions (clamped to 1-500)
    pub async fn start(&self, count: usize) -> Result<SimulationReport> {
        let runtime = self.pipeline.config.runtime_config().await?;
        if !runtime.simulation_mode {
            return Err(SdkError::SimulationDisabled);
        }
        let count = count.clamp(1, MAX_SIMULATION_COUNT);

        let publisher = self.pipeline.publisher();
        if let Err(e) = publisher.publish_simulation_event(&json!({
            "type": "simulation.started",
            "count": count,
            "startedAt": Utc::now(),
        })) {
            tracing::error!("Failed to publish simulation start: {}", e);
        }
        tracing::info!("Simulation started with {} transactions", count);

        let requests = generate_requests(count, Utc::now(), &mut rand::thread_rng());
        for request in requests {
            self.pipeline.create(request).await?;
        }

        if let Err(e) = publisher.publish_simulation_event(&json!({
            "type": "simulation.completed",
            "count": count,
            "completedAt": Utc::now(),
        })) {
            tracing::error!("Failed to publish simulation completion: {}", e);
        }
        tracing::info!("Simulation completed ({} transactions)", count);

        Ok(SimulationReport { generated: count })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_shape() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(7);
        let requests = generate_requests(30, now, &mut rng);

        assert_eq!(requests.len(), 30);
        for (i, request) in requests.iter().enumerate() {
            assert!(request.validate().is_ok());
            assert_eq!(request.user_id, format!("sim-user-{}", (i % 12) + 1));
            assert_eq!(request.timestamp, Some(now - Duration::seconds(i as i64)));
            assert!(request.ip_address.starts_with("10.0."));
            assert!(SAMPLE_LOCATIONS.contains(&request.location.as_str()));
            assert!(request
                .transaction_id
                .as_deref()
                .unwrap()
                .starts_with("sim-"));

            if i % 6 == 0 {
                assert!((50_000.0..=110_000.0).contains(&request.amount));
            } else {
                assert!((20.0..=5_020.0).contains(&request.amount));
            }
            if i % 5 == 0 {
                assert!(request.device_id.starts_with("unknown-"));
                assert_eq!(request.device_id.len(), "unknown-".len() + 6);
            } else {
                assert_eq!(request.device_id, format!("device-{}", (i % 20) + 1));
            }
        }
    }
}
