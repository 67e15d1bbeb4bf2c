//! Metrics sink port.

use std::time::Duration;

pub const CONVERGE_TASK_RUNS: &str = "ConvergenceTaskRuns";
pub const CONVERGE_TASK_DURATION: &str = "ConvergenceTaskDuration";
pub const TASKS_KICKED: &str = "ConvergenceTasksKicked";
pub const TASKS_PRUNED: &str = "ConvergenceTasksPruned";
pub const TASKS_PENDING: &str = "TasksPending";
pub const TASKS_RUNNING: &str = "TasksRunning";
pub const TASKS_COMPLETED: &str = "TasksCompleted";
pub const TASKS_RESOLVING: &str = "TasksResolving";

/// Receives named counters, gauges and durations.
///
/// Delivery is fire-and-forget; a sink that cannot ship a metric logs it and
/// moves on.
pub trait MetricsSink: Send + Sync {
    fn increment_counter(&self, name: &str) {
        self.add_to_counter(name, 1);
    }

    fn add_to_counter(&self, name: &str, value: u64);

    fn record_duration(&self, name: &str, duration: Duration);

    fn record_gauge(&self, name: &str, value: u64);
}
