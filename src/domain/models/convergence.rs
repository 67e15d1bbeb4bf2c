//! Inputs and outputs of a task convergence pass.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::task::{Task, TaskStartRequest, TaskStateCounts};

/// The three age limits a convergence pass enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceThresholds {
    /// Pending, resolving and completed tasks untouched for longer are kicked.
    pub kick_tasks_after: Duration,
    /// Pending tasks older than this are failed.
    pub expire_pending_after: Duration,
    /// Completed tasks whose first completion is older than this are deleted.
    pub expire_completed_after: Duration,
}

impl ConvergenceThresholds {
    pub const fn new(
        kick_tasks_after: Duration,
        expire_pending_after: Duration,
        expire_completed_after: Duration,
    ) -> Self {
        Self {
            kick_tasks_after,
            expire_pending_after,
            expire_completed_after,
        }
    }
}

/// Counts gathered during one pass; the same numbers go to the metrics sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    pub expired_pending: u64,
    pub failed_on_missing_cells: u64,
    pub demoted_resolving: u64,
    pub deleted_completed: u64,
    /// Rows skipped because their stored record could not be deserialized
    pub failed_fetches: u64,
    pub kicked: u64,
    pub pruned: u64,
    pub counts: TaskStateCounts,
}

/// What the caller must act on after a pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceResult {
    /// Pending tasks to resubmit to placement
    pub tasks_to_start: Vec<TaskStartRequest>,
    /// Completed tasks whose callback must be (re)delivered
    pub tasks_to_complete: Vec<Task>,
    pub report: ConvergenceReport,
}
