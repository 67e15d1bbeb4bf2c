//! `bulletin converge`: one task convergence pass.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::adapters::metrics::{FanOutMetricsSink, RecordingMetricsSink, TracingMetricsSink};
use crate::adapters::sqlite::SqliteTaskStore;
use crate::cli::commands::open_database;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{CellSet, Config, ConvergenceReport, ConvergenceResult};
use crate::domain::ports::{MetricsSink, SystemClock};
use crate::services::TaskConvergenceEngine;

#[derive(Args, Debug)]
pub struct ConvergeArgs {
    /// Live cell id; repeat or comma-separate. No cells means every cell is gone.
    #[arg(long = "cell", value_delimiter = ',')]
    pub cells: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct StartRequestOutput {
    pub task_guid: String,
    pub domain: String,
}

#[derive(Debug, Serialize)]
pub struct CompletionOutput {
    pub task_guid: String,
    pub domain: String,
    pub failed: bool,
    pub failure_reason: String,
    pub callback_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConvergeOutput {
    pub live_cells: Vec<String>,
    pub report: ConvergenceReport,
    pub tasks_to_start: Vec<StartRequestOutput>,
    pub tasks_to_complete: Vec<CompletionOutput>,
    pub metrics: BTreeMap<String, u64>,
}

impl ConvergeOutput {
    fn new(
        live_cells: Vec<String>,
        result: ConvergenceResult,
        metrics: &RecordingMetricsSink,
    ) -> Self {
        let snapshot = metrics.snapshot();
        let metrics = snapshot
            .counters
            .into_iter()
            .chain(snapshot.gauges)
            .collect();

        Self {
            live_cells,
            report: result.report,
            tasks_to_start: result
                .tasks_to_start
                .into_iter()
                .map(|r| StartRequestOutput {
                    task_guid: r.task_guid,
                    domain: r.domain,
                })
                .collect(),
            tasks_to_complete: result
                .tasks_to_complete
                .into_iter()
                .map(|t| CompletionOutput {
                    callback_url: t.task_definition.completion_callback_url,
                    task_guid: t.task_guid,
                    domain: t.domain,
                    failed: t.failed,
                    failure_reason: t.failure_reason,
                })
                .collect(),
            metrics,
        }
    }
}

impl CommandOutput for ConvergeOutput {
    fn to_human(&self) -> String {
        let r = &self.report;
        let mut lines = vec![
            format!("Convergence pass over {} live cell(s)", self.live_cells.len()),
            format!("  expired pending:        {}", r.expired_pending),
            format!("  failed on missing cell: {}", r.failed_on_missing_cells),
            format!("  demoted resolving:      {}", r.demoted_resolving),
            format!("  deleted completed:      {}", r.deleted_completed),
            format!("  failed fetches:         {}", r.failed_fetches),
            format!("  kicked: {}  pruned: {}", r.kicked, r.pruned),
            format!(
                "  tasks: {} pending, {} running, {} completed, {} resolving",
                r.counts.pending, r.counts.running, r.counts.completed, r.counts.resolving
            ),
        ];

        if !self.tasks_to_start.is_empty() {
            lines.push(format!("\nTasks to start ({}):", self.tasks_to_start.len()));
            for t in &self.tasks_to_start {
                lines.push(format!("  {:<40} {}", t.task_guid, t.domain));
            }
        }

        if !self.tasks_to_complete.is_empty() {
            lines.push(format!("\nTasks to complete ({}):", self.tasks_to_complete.len()));
            for t in &self.tasks_to_complete {
                let outcome = if t.failed {
                    format!("failed: {}", t.failure_reason)
                } else {
                    "succeeded".to_string()
                };
                lines.push(format!("  {:<40} {:<12} {}", t.task_guid, t.domain, outcome));
            }
        }

        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: ConvergeArgs, config: &Config, json_mode: bool) -> Result<()> {
    let pool = open_database(config).await?;
    let store = Arc::new(SqliteTaskStore::new(pool));
    let metrics = Arc::new(RecordingMetricsSink::new());
    let sinks: Vec<Arc<dyn MetricsSink>> = vec![metrics.clone(), Arc::new(TracingMetricsSink)];
    let sink = FanOutMetricsSink::new(sinks);
    let engine = TaskConvergenceEngine::new(store, Arc::new(SystemClock), Arc::new(sink));

    let cells: CellSet = args.cells.iter().map(String::as_str).collect();
    let result = engine.converge(&cells, &config.convergence.thresholds()).await;

    output(&ConvergeOutput::new(cells.cell_ids(), result, &metrics), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Task, TaskDefinition, TaskStartRequest, TaskState};
    use crate::domain::ports::metrics::{CONVERGE_TASK_RUNS, TASKS_PENDING};
    use crate::domain::ports::MetricsSink;

    #[test]
    fn test_output_lists_actionable_tasks() {
        let mut completed = Task::new_pending("done-1", "cf-tasks", TaskDefinition::default(), 0);
        completed.state = TaskState::Completed;
        completed.failed = true;
        completed.failure_reason = "cell disappeared before completion".to_string();
        let pending = Task::new_pending("todo-1", "cf-tasks", TaskDefinition::default(), 0);

        let metrics = RecordingMetricsSink::new();
        metrics.increment_counter(CONVERGE_TASK_RUNS);
        metrics.record_gauge(TASKS_PENDING, 1);

        let result = ConvergenceResult {
            tasks_to_start: vec![TaskStartRequest::from(pending)],
            tasks_to_complete: vec![completed],
            report: ConvergenceReport {
                kicked: 2,
                ..Default::default()
            },
        };
        let out = ConvergeOutput::new(vec!["cell-a".to_string()], result, &metrics);

        let human = out.to_human();
        assert!(human.contains("Tasks to start (1)"));
        assert!(human.contains("todo-1"));
        assert!(human.contains("failed: cell disappeared before completion"));

        let json = out.to_json();
        assert_eq!(json["report"]["kicked"], 2);
        assert_eq!(json["metrics"]["TasksPending"], 1);
        assert_eq!(json["metrics"]["ConvergenceTaskRuns"], 1);
    }
}
