//! Task domain model.
//!
//! A task is a one-shot unit of work. It is created `Pending` by the placement
//! API, claimed by a cell (`Running`), finishes (`Completed`), and is finally
//! resolved by the completion-callback pipeline (`Resolving`, then deleted).

use serde::{Deserialize, Serialize};

/// Failure reason stamped on pending tasks that were never placed in time.
pub const FAILURE_REASON_NOT_STARTED: &str = "not started within time limit";

/// Failure reason stamped on running tasks whose cell vanished.
pub const FAILURE_REASON_CELL_DISAPPEARED: &str = "cell disappeared before completion";

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Waiting to be placed on a cell
    Pending,
    /// Claimed and executing on a cell
    Running,
    /// Finished; completion callback not yet delivered
    Completed,
    /// Completion callback in flight
    Resolving,
}

impl Default for TaskState {
    fn default() -> Self {
        Self::Pending
    }
}

impl TaskState {
    pub const ALL: [TaskState; 4] = [
        Self::Pending,
        Self::Running,
        Self::Completed,
        Self::Resolving,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Resolving => "resolving",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "resolving" => Some(Self::Resolving),
            _ => None,
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Description of the work a task performs.
///
/// Owned by the caller. Convergence only carries it through to start requests,
/// it never looks inside.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    #[serde(default)]
    pub root_fs: String,
    /// Action graph, kept as raw JSON
    #[serde(default)]
    pub action: serde_json::Value,
    #[serde(default)]
    pub memory_mb: i32,
    #[serde(default)]
    pub disk_mb: i32,
    #[serde(default)]
    pub cpu_weight: u32,
    #[serde(default)]
    pub log_guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_callback_url: Option<String>,
    #[serde(default)]
    pub result_file: String,
    #[serde(default)]
    pub annotation: String,
}

/// A stored task.
///
/// Timestamps are unix nanoseconds. `first_completed_at` is zero until the task
/// first enters `Completed` and is never rewritten afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_guid: String,
    pub domain: String,
    pub state: TaskState,
    pub cell_id: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub first_completed_at: i64,
    pub failed: bool,
    pub failure_reason: String,
    pub result: String,
    pub task_definition: TaskDefinition,
}

impl Task {
    /// A freshly desired task, as the placement API would create it.
    pub fn new_pending(
        task_guid: impl Into<String>,
        domain: impl Into<String>,
        task_definition: TaskDefinition,
        now: i64,
    ) -> Self {
        Self {
            task_guid: task_guid.into(),
            domain: domain.into(),
            state: TaskState::Pending,
            cell_id: String::new(),
            created_at: now,
            updated_at: now,
            first_completed_at: 0,
            failed: false,
            failure_reason: String::new(),
            result: String::new(),
            task_definition,
        }
    }
}

/// Request handed to the placement subsystem to (re)start a pending task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStartRequest {
    pub task_guid: String,
    pub domain: String,
    pub definition: TaskDefinition,
}

impl From<Task> for TaskStartRequest {
    fn from(task: Task) -> Self {
        Self {
            task_guid: task.task_guid,
            domain: task.domain,
            definition: task.task_definition,
        }
    }
}

/// Row counts per task state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStateCounts {
    pub pending: u64,
    pub running: u64,
    pub completed: u64,
    pub resolving: u64,
}

impl TaskStateCounts {
    pub fn record(&mut self, state: TaskState, count: u64) {
        match state {
            TaskState::Pending => self.pending += count,
            TaskState::Running => self.running += count,
            TaskState::Completed => self.completed += count,
            TaskState::Resolving => self.resolving += count,
        }
    }

    pub const fn total(&self) -> u64 {
        self.pending + self.running + self.completed + self.resolving
    }
}
