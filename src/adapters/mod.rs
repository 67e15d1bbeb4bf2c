//! Infrastructure adapters for storage and metrics.

pub mod memory;
pub mod metrics;
pub mod sqlite;

pub use memory::InMemoryTreeStore;
pub use metrics::{FanOutMetricsSink, MetricsSnapshot, RecordingMetricsSink, TracingMetricsSink};
