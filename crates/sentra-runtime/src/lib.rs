//! Sentra Runtime - risk-decision pipeline components
//!
//! Geo resolution, profile building, rule evaluation, ML scoring behind a
//! circuit breaker, score combination, autonomous alerts, device tracking
//! and event fan-out. External collaborators (stores, ML scorer, geo-IP
//! service, bus, audit log, config) are traits with in-memory or HTTP
//! implementations.

pub mod audit;
pub mod config;
pub mod device;
pub mod error;
pub mod event_bus;
pub mod geo;
pub mod ml;
pub mod observability;
pub mod profile;
pub mod response;
pub mod rules;
pub mod scoring;
pub mod storage;

#[cfg(test)]
mod testing;

// Re-export main types
pub use audit::{AuditActor, AuditEntry, AuditSink, InMemoryAuditLog};
pub use config::{ConfigProvider, InMemoryConfigProvider};
pub use device::{DeviceObservation, DeviceTracker};
pub use error::{Result, RuntimeError};
pub use event_bus::{Channel, EventBus, EventPublisher, InMemoryEventBus};
pub use geo::{GeoCache, GeoLookup, GeoResolver, HttpGeoLookup, ResolvedGeo};
pub use ml::{
    CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot, HttpMlScorer, MlPrediction, MlScorer,
    MlScoringClient, ModelInfo, PredictRequest,
};
pub use observability::{Metrics, MetricsCollector, MetricsSnapshot};
pub use profile::ProfileBuilder;
pub use response::{AlertCandidate, AutonomousResponder};
pub use rules::{RuleEngine, RuleEvaluation, ScoringInput};
pub use scoring::{FraudScorer, ScoringOutcome};
pub use storage::{AlertStore, DeviceStore, InMemoryStore, ProfileStore, TransactionStore};
