//! Circuit breaker guarding the ML scorer
//!
//! `Healthy -> Degraded -> Offline`, driven by a consecutive-failure
//! counter. While `Offline` and before `open_until`, attempts are refused
//! without calling the scorer. The first attempt after `open_until` moves
//! the state to `Degraded` and is let through as a probe.
//!
//! All transitions happen under one mutex, and the lock is never held
//! across an await point. Concurrent transactions may interleave their
//! success/failure reports; the counter saturates and never goes negative.

use chrono::{DateTime, Utc};
use sentra_core::MlHealth;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Failures before the circuit opens
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;
/// How long the circuit stays open
pub const DEFAULT_RESET_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub reset_window: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_window: DEFAULT_RESET_WINDOW,
        }
    }
}

/// Point-in-time view of the breaker for health reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitSnapshot {
    pub status: MlHealth,
    pub failure_count: u32,
    pub last_latency_ms: u64,
    pub last_error: Option<String>,
    pub circuit_open_until: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct BreakerState {
    status: MlHealth,
    failure_count: u32,
    last_latency_ms: u64,
    last_error: Option<String>,
    open_until: Option<DateTime<Utc>>,
}

/// Circuit breaker state machine
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    state: Mutex<BreakerState>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config: CircuitBreakerConfig {
                failure_threshold: config.failure_threshold.max(1),
                reset_window: config.reset_window,
            },
            state: Mutex::new(BreakerState {
                status: MlHealth::Healthy,
                failure_count: 0,
                last_latency_ms: 0,
                last_error: None,
                open_until: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        // A panic while holding the lock cannot leave a half-written counter
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ask whether a call may be attempted at `now`
    ///
    /// Returns the open-until instant when the call must be refused.
    pub fn try_acquire(&self, now: DateTime<Utc>) -> Result<(), DateTime<Utc>> {
        let mut state = self.lock();
        if state.status != MlHealth::Offline {
            return Ok(());
        }
        match state.open_until {
            Some(until) if now < until => Err(until),
            _ => {
                state.status = MlHealth::Degraded;
                tracing::info!("ML circuit half-open, probing scorer");
                Ok(())
            }
        }
    }

    pub fn record_success(&self, latency: Duration) {
        let mut state = self.lock();
        if state.status != MlHealth::Healthy {
            tracing::info!("ML scorer recovered, circuit closed");
        }
        state.status = MlHealth::Healthy;
        state.failure_count = 0;
        state.last_error = None;
        state.open_until = None;
        state.last_latency_ms = latency.as_millis().min(u128::from(u64::MAX)) as u64;
    }

    pub fn record_failure(&self, reason: impl Into<String>, now: DateTime<Utc>) {
        let reason = reason.into();
        let mut state = self.lock();
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_error = Some(reason.clone());

        if state.failure_count >= self.config.failure_threshold {
            let reset = chrono::Duration::from_std(self.config.reset_window)
                .unwrap_or_else(|_| chrono::Duration::seconds(60));
            let until = now + reset;
            state.status = MlHealth::Offline;
            state.open_until = Some(until);
            tracing::warn!(
                "ML circuit opened after {} failures until {}: {}",
                state.failure_count,
                until,
                reason
            );
        } else {
            state.status = MlHealth::Degraded;
            tracing::warn!(
                "ML scorer failure {}/{}: {}",
                state.failure_count,
                self.config.failure_threshold,
                reason
            );
        }
    }

    pub fn status(&self) -> MlHealth {
        self.lock().status
    }

    pub fn snapshot(&self) -> CircuitSnapshot {
        let state = self.lock();
        CircuitSnapshot {
            status: state.status,
            failure_count: state.failure_count,
            last_latency_ms: state.last_latency_ms,
            last_error: state.last_error.clone(),
            circuit_open_until: state.open_until,
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
