//! Sentra Core - domain types for the risk-decision pipeline
//!
//! This crate holds the records the pipeline produces and consumes, the
//! closed enums used at the decision points, and the operator-tunable
//! runtime configuration.

pub mod alert;
pub mod config;
pub mod device;
pub mod error;
pub mod profile;
pub mod risk;
pub mod transaction;

pub use alert::{AlertStatus, FraudAlert};
pub use config::{RuntimeConfig, RuntimeConfigPatch, WEIGHT_TOLERANCE};
pub use device::UserDevice;
pub use error::{CoreError, Result};
pub use profile::UserRiskProfile;
pub use risk::{MlHealth, ResponseAction, RiskTier};
pub use transaction::{FeatureExplanation, GeoPoint, Transaction};
