//! Metrics collection and reporting

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

/// Transactions that completed scoring and were persisted
pub const TRANSACTIONS_SCORED: &str = "transactions_scored";
/// Transactions scored with the rule score only
pub const ML_FALLBACKS: &str = "ml_fallbacks";
pub const ALERTS_CREATED: &str = "alerts_created";
pub const PUBLISH_FAILURES: &str = "publish_failures";
/// Failures after persistence that were logged and swallowed
pub const POST_PERSIST_FAILURES: &str = "post_persist_failures";
/// End-to-end scoring latency, milliseconds
pub const SCORING_LATENCY_MS: &str = "scoring_latency_ms";

/// Samples kept per histogram; older ones are dropped first
const MAX_HISTOGRAM_SAMPLES: usize = 10_000;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Counter metric
#[derive(Debug, Clone)]
pub struct Counter {
    name: String,
    value: Arc<RwLock<u64>>,
}

impl Counter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Arc::new(RwLock::new(0)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn inc(&self) {
        self.add(1);
    }

    pub fn add(&self, value: u64) {
        let mut current = write(&self.value);
        *current = current.saturating_add(value);
    }

    pub fn get(&self) -> u64 {
        *read(&self.value)
    }

    pub fn reset(&self) {
        *write(&self.value) = 0;
    }
}

/// Histogram metric for tracking distributions
#[derive(Debug, Clone)]
pub struct Histogram {
    name: String,
    values: Arc<RwLock<VecDeque<f64>>>,
}

impl Histogram {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Arc::new(RwLock::new(VecDeque::new())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn observe(&self, value: f64) {
        let mut values = write(&self.values);
        if values.len() == MAX_HISTOGRAM_SAMPLES {
            values.pop_front();
        }
        values.push_back(value);
    }

    /// Observe a duration in milliseconds
    pub fn observe_duration(&self, duration: Duration) {
        self.observe(duration.as_secs_f64() * 1000.0);
    }

    pub fn count(&self) -> usize {
        read(&self.values).len()
    }

    pub fn sum(&self) -> f64 {
        read(&self.values).iter().sum()
    }

    pub fn avg(&self) -> f64 {
        let values = read(&self.values);
        if values.is_empty() {
            0.0
        } else {
            values.iter().sum::<f64>() / values.len() as f64
        }
    }

    /// Get percentile (0-100)
    pub fn percentile(&self, p: f64) -> f64 {
        let mut values: Vec<f64> = read(&self.values).iter().copied().collect();
        if values.is_empty() {
            return 0.0;
        }

        values.sort_by(|a, b| a.total_cmp(b));
        let index = ((p.clamp(0.0, 100.0) / 100.0) * (values.len() - 1) as f64).round() as usize;
        values[index]
    }

    pub fn reset(&self) {
        write(&self.values).clear();
    }

    pub fn summary(&self) -> HistogramSummary {
        HistogramSummary {
            count: self.count(),
            avg: self.avg(),
            p50: self.percentile(50.0),
            p95: self.percentile(95.0),
            p99: self.percentile(99.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSummary {
    pub count: usize,
    pub avg: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

/// Point-in-time copy of every registered metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub counters: BTreeMap<String, u64>,
    pub histograms: BTreeMap<String, HistogramSummary>,
}

/// Metrics trait
pub trait Metrics: Send + Sync {
    fn counter(&self, name: &str) -> Arc<Counter>;

    fn histogram(&self, name: &str) -> Arc<Histogram>;

    fn snapshot(&self) -> MetricsSnapshot;
}

/// Metrics collector
#[derive(Debug)]
pub struct MetricsCollector {
    counters: RwLock<HashMap<String, Arc<Counter>>>,
    histograms: RwLock<HashMap<String, Arc<Histogram>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
            histograms: RwLock::new(HashMap::new()),
        }
    }

    /// Collector with the pipeline's metrics registered at zero
    pub fn for_pipeline() -> Self {
        let collector = Self::new();
        for name in [
            TRANSACTIONS_SCORED,
            ML_FALLBACKS,
            ALERTS_CREATED,
            PUBLISH_FAILURES,
            POST_PERSIST_FAILURES,
        ] {
            collector.counter(name);
        }
        collector.histogram(SCORING_LATENCY_MS);
        collector
    }

    pub fn reset_all(&self) {
        for counter in read(&self.counters).values() {
            counter.reset();
        }
        for histogram in read(&self.histograms).values() {
            histogram.reset();
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics for MetricsCollector {
    fn counter(&self, name: &str) -> Arc<Counter> {
        if let Some(counter) = read(&self.counters).get(name) {
            return counter.clone();
        }
        write(&self.counters)
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Counter::new(name)))
            .clone()
    }

    fn histogram(&self, name: &str) -> Arc<Histogram> {
        if let Some(histogram) = read(&self.histograms).get(name) {
            return histogram.clone();
        }
        write(&self.histograms)
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Histogram::new(name)))
            .clone()
    }

    fn snapshot(&self) -> MetricsSnapshot {
        let counters = read(&self.counters)
            .iter()
            .map(|(name, counter)| (name.clone(), counter.get()))
            .collect();
        let histograms = read(&self.histograms)
            .iter()
            .map(|(name, histogram)| (name.clone(), histogram.summary()))
            .collect();
        MetricsSnapshot {
            counters,
            histograms,
        }
    }
}
