//! Port trait definitions (Hexagonal Architecture)
//!
//! The services only talk to storage, time and metrics through these traits:
//! - TaskStore: relational task table
//! - TreeStore: hierarchical actual-LRP records
//! - VersionStore: configuration table holding the data version
//! - Clock: current time
//! - MetricsSink: counters, gauges and durations

pub mod clock;
pub mod metrics;
pub mod task_store;
pub mod tree_store;
pub mod version_store;

pub use clock::{duration_nanos, unix_nanos, Clock, FixedClock, SystemClock};
pub use metrics::MetricsSink;
pub use task_store::{TaskChanges, TaskFilter, TaskStore};
pub use tree_store::TreeStore;
pub use version_store::VersionStore;
