//! Task convergence engine.
//!
//! One pass applies a fixed sequence of repair rules to the task table:
//!
//! 1. fail pending tasks that were never placed in time
//! 2. collect kickable pending tasks as start requests
//! 3. fail running tasks whose cell is gone
//! 4. demote stalled resolving tasks back to completed
//! 5. delete completed tasks past their retention window
//! 6. collect kickable completed tasks for callback redelivery
//! 7. count tasks per state and emit metrics
//!
//! Every rule is committed on its own. A store error only skips the rule it
//! happened in; the pass always runs to the end.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info, info_span, Instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CellSet, ConvergenceReport, ConvergenceResult, ConvergenceThresholds, Task, TaskStartRequest,
    TaskState, TaskStateCounts, FAILURE_REASON_CELL_DISAPPEARED, FAILURE_REASON_NOT_STARTED,
};
use crate::domain::ports::metrics::{
    CONVERGE_TASK_DURATION, CONVERGE_TASK_RUNS, TASKS_COMPLETED, TASKS_KICKED, TASKS_PENDING,
    TASKS_PRUNED, TASKS_RESOLVING, TASKS_RUNNING,
};
use crate::domain::ports::{duration_nanos, Clock, MetricsSink, TaskChanges, TaskFilter, TaskStore};

pub struct TaskConvergenceEngine<S: TaskStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn MetricsSink>,
}

impl<S: TaskStore> TaskConvergenceEngine<S> {
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>, metrics: Arc<dyn MetricsSink>) -> Self {
        Self {
            store,
            clock,
            metrics,
        }
    }

    /// Run one convergence pass against `live_cells`.
    ///
    /// Callers must not overlap passes.
    pub async fn converge(
        &self,
        live_cells: &CellSet,
        thresholds: &ConvergenceThresholds,
    ) -> ConvergenceResult {
        let span = info_span!("converge-tasks", live_cells = live_cells.len());
        self.converge_inner(live_cells, thresholds).instrument(span).await
    }

    async fn converge_inner(
        &self,
        live_cells: &CellSet,
        thresholds: &ConvergenceThresholds,
    ) -> ConvergenceResult {
        info!("starting");
        self.metrics.increment_counter(CONVERGE_TASK_RUNS);
        let started = Instant::now();

        let now = self.clock.now_nanos();
        let kick_cutoff = now.saturating_sub(duration_nanos(thresholds.kick_tasks_after));
        let pending_cutoff = now.saturating_sub(duration_nanos(thresholds.expire_pending_after));
        let completed_cutoff =
            now.saturating_sub(duration_nanos(thresholds.expire_completed_after));

        let mut report = ConvergenceReport::default();

        report.expired_pending = self
            .fail_expired_pending_tasks(now, pending_cutoff)
            .instrument(info_span!("fail-expired-pending-tasks"))
            .await;

        let (tasks_to_start, failed_fetches) = self
            .kickable_pending_tasks(kick_cutoff, pending_cutoff)
            .instrument(info_span!("get-task-start-requests-for-kickable-pending-tasks"))
            .await;
        report.failed_fetches += failed_fetches;

        report.failed_on_missing_cells = self
            .fail_tasks_with_disappeared_cells(now, live_cells)
            .instrument(info_span!("fail-tasks-with-disappeared-cells"))
            .await;

        // Demoted rows keep first_completed_at, so the prune below sees them too.
        report.demoted_resolving = self
            .demote_kickable_resolving_tasks(kick_cutoff)
            .instrument(info_span!("demote-kickable-resolving-tasks"))
            .await;

        report.deleted_completed = self
            .delete_expired_completed_tasks(completed_cutoff)
            .instrument(info_span!("delete-expired-completed-tasks"))
            .await;

        let (tasks_to_complete, failed_fetches) = self
            .kickable_completed_tasks(kick_cutoff)
            .instrument(info_span!("get-kickable-complete-tasks-for-completion"))
            .await;
        report.failed_fetches += failed_fetches;

        report.counts = self
            .count_tasks_by_state()
            .instrument(info_span!("count-tasks"))
            .await;

        report.kicked = report.expired_pending
            + tasks_to_start.len() as u64
            + report.failed_on_missing_cells
            + tasks_to_complete.len() as u64;
        report.pruned = report.failed_fetches + report.deleted_completed;

        self.send_metrics(&report);
        self.metrics.record_duration(CONVERGE_TASK_DURATION, started.elapsed());
        info!(
            kicked = report.kicked,
            pruned = report.pruned,
            to_start = tasks_to_start.len(),
            to_complete = tasks_to_complete.len(),
            "completed"
        );

        ConvergenceResult {
            tasks_to_start,
            tasks_to_complete,
            report,
        }
    }

    async fn fail_expired_pending_tasks(&self, now: i64, pending_cutoff: i64) -> u64 {
        let filter = TaskFilter::in_state(TaskState::Pending).created_before(pending_cutoff);
        let changes = TaskChanges::fail(FAILURE_REASON_NOT_STARTED, now);
        affected_or_zero(self.store.update_tasks_matching(&filter, &changes).await)
    }

    async fn kickable_pending_tasks(
        &self,
        kick_cutoff: i64,
        pending_cutoff: i64,
    ) -> (Vec<TaskStartRequest>, u64) {
        let filter = TaskFilter::in_state(TaskState::Pending)
            .updated_at_most(kick_cutoff)
            .created_at_least(pending_cutoff);
        let (tasks, failed_fetches) = self.select_tasks(&filter).await;
        (tasks.into_iter().map(TaskStartRequest::from).collect(), failed_fetches)
    }

    async fn fail_tasks_with_disappeared_cells(&self, now: i64, live_cells: &CellSet) -> u64 {
        let filter = TaskFilter::in_state(TaskState::Running).cell_id_not_in(live_cells.cell_ids());
        let changes = TaskChanges::fail(FAILURE_REASON_CELL_DISAPPEARED, now);
        affected_or_zero(self.store.update_tasks_matching(&filter, &changes).await)
    }

    async fn demote_kickable_resolving_tasks(&self, kick_cutoff: i64) -> u64 {
        let filter = TaskFilter::in_state(TaskState::Resolving).updated_before(kick_cutoff);
        affected_or_zero(
            self.store
                .update_tasks_matching(&filter, &TaskChanges::demote_to_completed())
                .await,
        )
    }

    async fn delete_expired_completed_tasks(&self, completed_cutoff: i64) -> u64 {
        let filter =
            TaskFilter::in_state(TaskState::Completed).first_completed_before(completed_cutoff);
        affected_or_zero(self.store.delete_tasks_matching(&filter).await)
    }

    async fn kickable_completed_tasks(&self, kick_cutoff: i64) -> (Vec<Task>, u64) {
        let filter = TaskFilter::in_state(TaskState::Completed).updated_before(kick_cutoff);
        self.select_tasks(&filter).await
    }

    /// Matching tasks plus the number of rows that could not be deserialized.
    async fn select_tasks(&self, filter: &TaskFilter) -> (Vec<Task>, u64) {
        let rows = match self.store.select_tasks_matching(filter).await {
            Ok(rows) => rows,
            Err(err) => {
                error!(error = %err, "failed-query");
                return (Vec::new(), 0);
            }
        };

        let mut tasks = Vec::with_capacity(rows.len());
        let mut failed_fetches = 0;
        for row in rows {
            match row {
                Ok(task) => tasks.push(task),
                Err(err @ DomainError::Deserialize { .. }) => {
                    error!(error = %err, "failed-fetch");
                    failed_fetches += 1;
                }
                Err(err) => error!(error = %err, "failed-fetch"),
            }
        }
        debug!(tasks = tasks.len(), failed_fetches, "fetched tasks");
        (tasks, failed_fetches)
    }

    async fn count_tasks_by_state(&self) -> TaskStateCounts {
        self.store.count_tasks_by_state().await.unwrap_or_else(|err| {
            error!(error = %err, "failed-counting-tasks");
            TaskStateCounts::default()
        })
    }

    fn send_metrics(&self, report: &ConvergenceReport) {
        self.metrics.record_gauge(TASKS_PENDING, report.counts.pending);
        self.metrics.record_gauge(TASKS_RUNNING, report.counts.running);
        self.metrics.record_gauge(TASKS_COMPLETED, report.counts.completed);
        self.metrics.record_gauge(TASKS_RESOLVING, report.counts.resolving);
        self.metrics.add_to_counter(TASKS_KICKED, report.kicked);
        self.metrics.add_to_counter(TASKS_PRUNED, report.pruned);
    }
}

fn affected_or_zero(result: DomainResult<u64>) -> u64 {
    result.unwrap_or_else(|err| {
        error!(error = %err, "failed-updating-tasks");
        0
    })
}
