//! Metrics sink implementations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::info;

use crate::domain::ports::MetricsSink;

/// Emits every metric as a structured event on the `bulletin::metrics` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMetricsSink;

impl MetricsSink for TracingMetricsSink {
    fn add_to_counter(&self, name: &str, value: u64) {
        info!(target: "bulletin::metrics", metric = name, kind = "counter", value);
    }

    fn record_duration(&self, name: &str, duration: Duration) {
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        info!(target: "bulletin::metrics", metric = name, kind = "duration", duration_ms);
    }

    fn record_gauge(&self, name: &str, value: u64) {
        info!(target: "bulletin::metrics", metric = name, kind = "gauge", value);
    }
}

/// Forwards every metric to each of its sinks, in order.
#[derive(Clone, Default)]
pub struct FanOutMetricsSink {
    sinks: Vec<Arc<dyn MetricsSink>>,
}

impl FanOutMetricsSink {
    pub fn new(sinks: Vec<Arc<dyn MetricsSink>>) -> Self {
        Self { sinks }
    }
}

impl MetricsSink for FanOutMetricsSink {
    fn add_to_counter(&self, name: &str, value: u64) {
        for sink in &self.sinks {
            sink.add_to_counter(name, value);
        }
    }

    fn record_duration(&self, name: &str, duration: Duration) {
        for sink in &self.sinks {
            sink.record_duration(name, duration);
        }
    }

    fn record_gauge(&self, name: &str, value: u64) {
        for sink in &self.sinks {
            sink.record_gauge(name, value);
        }
    }
}

/// Everything a [`RecordingMetricsSink`] has received so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub counters: HashMap<String, u64>,
    pub gauges: HashMap<String, u64>,
    pub durations: HashMap<String, Vec<Duration>>,
}

impl MetricsSnapshot {
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn gauge(&self, name: &str) -> Option<u64> {
        self.gauges.get(name).copied()
    }

    pub fn duration_count(&self, name: &str) -> usize {
        self.durations.get(name).map_or(0, Vec::len)
    }
}

/// Keeps metrics in memory: counters accumulate, gauges keep the last value.
#[derive(Debug, Default)]
pub struct RecordingMetricsSink {
    inner: Mutex<MetricsSnapshot>,
}

impl RecordingMetricsSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, MetricsSnapshot> {
        // A panicking recorder leaves plain numbers behind; keep using them.
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl MetricsSink for RecordingMetricsSink {
    fn add_to_counter(&self, name: &str, value: u64) {
        *self.lock().counters.entry(name.to_string()).or_default() += value;
    }

    fn record_duration(&self, name: &str, duration: Duration) {
        self.lock()
            .durations
            .entry(name.to_string())
            .or_default()
            .push(duration);
    }

    fn record_gauge(&self, name: &str, value: u64) {
        self.lock().gauges.insert(name.to_string(), value);
    }
}
