//! Sentra SDK
//!
//! High-level API over the risk-decision pipeline: score transactions,
//! tune runtime settings, run simulations and report system health.

pub mod builder;
pub mod config;
pub mod error;
pub mod health;
pub mod pipeline;
pub mod settings;
pub mod simulation;

// Re-export main types
pub use builder::PipelineBuilder;
pub use config::PipelineConfig;
pub use error::{Result, SdkError};
pub use health::{ComponentStatus, SystemHealth, SystemHealthService};
pub use pipeline::{TransactionPipeline, TransactionRequest, DEFAULT_RECENT_LIMIT};
pub use settings::SettingsService;
pub use simulation::{SimulationReport, SimulationService, DEFAULT_SIMULATION_COUNT};

// Re-export commonly used types from dependencies
pub use sentra_core::{
    FraudAlert, MlHealth, ResponseAction, RiskTier, RuntimeConfig, RuntimeConfigPatch, Transaction,
};
pub use sentra_runtime::{AuditActor, MetricsCollector, MetricsSnapshot};
