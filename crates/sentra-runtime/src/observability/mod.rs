//! Observability: in-process pipeline metrics

pub mod metrics;

pub use metrics::{
    Counter, Histogram, HistogramSummary, Metrics, MetricsCollector, MetricsSnapshot,
    ALERTS_CREATED, ML_FALLBACKS, POST_PERSIST_FAILURES, PUBLISH_FAILURES, SCORING_LATENCY_MS,
    TRANSACTIONS_SCORED,
};
