//! ML scoring: HTTP scorer, circuit breaker and the client combining them

pub mod breaker;
pub mod client;
pub mod scorer;

pub use breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitSnapshot};
pub use client::{MlScoringClient, ModelInfo, DEFAULT_ML_TIMEOUT};
pub use scorer::{HttpMlScorer, MlPrediction, MlScorer, PredictRequest};
