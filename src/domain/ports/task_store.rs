use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Task, TaskState, TaskStateCounts};

/// Predicate over stored tasks. Every populated field must hold.
///
/// Timestamps are unix nanoseconds, compared against the stored columns.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub state: Option<TaskState>,
    /// `created_at < value`
    pub created_before: Option<i64>,
    /// `created_at >= value`
    pub created_at_least: Option<i64>,
    /// `updated_at < value`
    pub updated_before: Option<i64>,
    /// `updated_at <= value`
    pub updated_at_most: Option<i64>,
    /// `first_completed_at < value`
    pub first_completed_before: Option<i64>,
    /// `cell_id` is none of these; an empty list excludes nothing
    pub cell_id_not_in: Option<Vec<String>>,
}

impl TaskFilter {
    pub fn in_state(state: TaskState) -> Self {
        Self {
            state: Some(state),
            ..Default::default()
        }
    }

    pub const fn created_before(mut self, nanos: i64) -> Self {
        self.created_before = Some(nanos);
        self
    }

    pub const fn created_at_least(mut self, nanos: i64) -> Self {
        self.created_at_least = Some(nanos);
        self
    }

    pub const fn updated_before(mut self, nanos: i64) -> Self {
        self.updated_before = Some(nanos);
        self
    }

    pub const fn updated_at_most(mut self, nanos: i64) -> Self {
        self.updated_at_most = Some(nanos);
        self
    }

    pub const fn first_completed_before(mut self, nanos: i64) -> Self {
        self.first_completed_before = Some(nanos);
        self
    }

    pub fn cell_id_not_in(mut self, cell_ids: Vec<String>) -> Self {
        self.cell_id_not_in = Some(cell_ids);
        self
    }
}

/// Columns to overwrite on every task matched by a [`TaskFilter`].
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    pub state: Option<TaskState>,
    pub failed: Option<bool>,
    pub failure_reason: Option<String>,
    pub result: Option<String>,
    pub first_completed_at: Option<i64>,
    pub updated_at: Option<i64>,
}

impl TaskChanges {
    /// Force a task to `Completed` as a failure.
    ///
    /// Only used on tasks that have never completed, so stamping
    /// `first_completed_at` keeps it write-once.
    pub fn fail(reason: impl Into<String>, now: i64) -> Self {
        Self {
            state: Some(TaskState::Completed),
            failed: Some(true),
            failure_reason: Some(reason.into()),
            result: Some(String::new()),
            first_completed_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Move a stalled resolving task back to `Completed`, touching nothing else.
    pub fn demote_to_completed() -> Self {
        Self {
            state: Some(TaskState::Completed),
            ..Default::default()
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.state.is_none()
            && self.failed.is_none()
            && self.failure_reason.is_none()
            && self.result.is_none()
            && self.first_completed_at.is_none()
            && self.updated_at.is_none()
    }
}

/// Relational store of task records.
///
/// Each operation is committed on its own; nothing here spans several calls.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new task
    async fn insert(&self, task: &Task) -> DomainResult<()>;

    /// Get a task by guid
    async fn get(&self, task_guid: &str) -> DomainResult<Option<Task>>;

    /// Overwrite `changes` on every matching row, returning the affected count
    async fn update_tasks_matching(
        &self,
        filter: &TaskFilter,
        changes: &TaskChanges,
    ) -> DomainResult<u64>;

    /// Delete every matching row, returning the affected count
    async fn delete_tasks_matching(&self, filter: &TaskFilter) -> DomainResult<u64>;

    /// Read matching rows ordered by creation time.
    ///
    /// The outer error is a failed query; an inner error is one row that could
    /// not be converted into a [`Task`].
    async fn select_tasks_matching(
        &self,
        filter: &TaskFilter,
    ) -> DomainResult<Vec<DomainResult<Task>>>;

    /// Row counts per state
    async fn count_tasks_by_state(&self) -> DomainResult<TaskStateCounts>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_builders_set_bounds() {
        let filter = TaskFilter::in_state(TaskState::Pending)
            .created_before(100)
            .created_at_least(10)
            .updated_at_most(200);
        assert_eq!(filter.state, Some(TaskState::Pending));
        assert_eq!(filter.created_before, Some(100));
        assert_eq!(filter.created_at_least, Some(10));
        assert_eq!(filter.updated_at_most, Some(200));
        assert_eq!(filter.updated_before, None);
        assert_eq!(filter.first_completed_before, None);
        assert_eq!(TaskFilter::default().state, None);
    }

    #[test]
    fn test_cell_exclusion_keeps_list() {
        let filter = TaskFilter::in_state(TaskState::Running)
            .cell_id_not_in(vec!["cell-a".to_string()]);
        assert_eq!(filter.cell_id_not_in, Some(vec!["cell-a".to_string()]));
    }

    #[test]
    fn test_fail_changes_stamp_completion() {
        let changes = TaskChanges::fail("boom", 77);
        assert_eq!(changes.state, Some(TaskState::Completed));
        assert_eq!(changes.failed, Some(true));
        assert_eq!(changes.failure_reason.as_deref(), Some("boom"));
        assert_eq!(changes.result.as_deref(), Some(""));
        assert_eq!(changes.first_completed_at, Some(77));
        assert_eq!(changes.updated_at, Some(77));
    }

    #[test]
    fn test_demote_leaves_timestamps_alone() {
        let changes = TaskChanges::demote_to_completed();
        assert_eq!(changes.state, Some(TaskState::Completed));
        assert_eq!(changes.updated_at, None);
        assert_eq!(changes.first_completed_at, None);
        assert!(!changes.is_empty());
        assert!(TaskChanges::default().is_empty());
    }
}
