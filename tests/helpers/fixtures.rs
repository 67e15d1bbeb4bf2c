use std::time::Duration;

use bulletin::domain::models::{
    ActualLRP, ActualLRPState, ConvergenceThresholds, Task, TaskDefinition, TaskState,
};

/// Fixed "now" for convergence tests, in unix nanoseconds.
pub const NOW: i64 = 1_700_000_000_000_000_000;

pub const KICK: Duration = Duration::from_secs(30);
pub const EXPIRE_PENDING: Duration = Duration::from_secs(1800);
pub const EXPIRE_COMPLETED: Duration = Duration::from_secs(120);

pub fn thresholds() -> ConvergenceThresholds {
    ConvergenceThresholds::new(KICK, EXPIRE_PENDING, EXPIRE_COMPLETED)
}

pub fn nanos(duration: Duration) -> i64 {
    i64::try_from(duration.as_nanos()).expect("duration fits in i64")
}

/// A task in `state`, created and last updated at the given instants.
///
/// Completed and resolving tasks first completed at `updated_at`.
pub fn task_at(guid: &str, state: TaskState, created_at: i64, updated_at: i64) -> Task {
    let definition = TaskDefinition {
        root_fs: "docker:///busybox".to_string(),
        action: serde_json::json!({ "run": { "path": "/bin/true" } }),
        memory_mb: 128,
        completion_callback_url: Some(format!("http://callbacks.local/{guid}")),
        ..Default::default()
    };
    let mut task = Task::new_pending(guid, "tests", definition, created_at);
    task.state = state;
    task.updated_at = updated_at;
    if state != TaskState::Pending {
        task.cell_id = "cell-a".to_string();
    }
    if matches!(state, TaskState::Completed | TaskState::Resolving) {
        task.first_completed_at = updated_at;
    }
    task
}

pub fn actual_lrp(process_guid: &str, index: i32, domain: &str, cell_id: &str) -> ActualLRP {
    ActualLRP {
        process_guid: process_guid.to_string(),
        index,
        domain: domain.to_string(),
        instance_guid: format!("{process_guid}-{index}-{cell_id}"),
        cell_id: cell_id.to_string(),
        state: ActualLRPState::Running,
        since: NOW,
        crash_count: 0,
        placement_error: String::new(),
    }
}

pub fn to_json(lrp: &ActualLRP) -> String {
    serde_json::to_string(lrp).expect("actual lrp serializes")
}
