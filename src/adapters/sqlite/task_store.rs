//! SQLite implementation of the TaskStore.

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::warn;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Task, TaskDefinition, TaskState, TaskStateCounts};
use crate::domain::ports::{TaskChanges, TaskFilter, TaskStore};

#[derive(Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

impl SqliteTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl TaskStore for SqliteTaskStore {
    async fn insert(&self, task: &Task) -> DomainResult<()> {
        let definition_json = serde_json::to_string(&task.task_definition)
            .map_err(|e| DomainError::Adapter(format!("cannot encode task definition: {e}")))?;

        sqlx::query(
            r#"INSERT INTO tasks (task_guid, domain, state, cell_id, created_at, updated_at,
               first_completed_at, failed, failure_reason, result, task_definition)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&task.task_guid)
        .bind(&task.domain)
        .bind(task.state.as_str())
        .bind(&task.cell_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .bind(task.first_completed_at)
        .bind(task.failed)
        .bind(&task.failure_reason)
        .bind(&task.result)
        .bind(&definition_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, task_guid: &str) -> DomainResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE task_guid = ?")
            .bind(task_guid)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Task::try_from).transpose()
    }

    async fn update_tasks_matching(
        &self,
        filter: &TaskFilter,
        changes: &TaskChanges,
    ) -> DomainResult<u64> {
        if changes.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE tasks SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(state) = changes.state {
                set.push("state = ");
                set.push_bind_unseparated(state.as_str());
            }
            if let Some(failed) = changes.failed {
                set.push("failed = ");
                set.push_bind_unseparated(failed);
            }
            if let Some(reason) = &changes.failure_reason {
                set.push("failure_reason = ");
                set.push_bind_unseparated(reason.clone());
            }
            if let Some(result) = &changes.result {
                set.push("result = ");
                set.push_bind_unseparated(result.clone());
            }
            if let Some(at) = changes.first_completed_at {
                set.push("first_completed_at = ");
                set.push_bind_unseparated(at);
            }
            if let Some(at) = changes.updated_at {
                set.push("updated_at = ");
                set.push_bind_unseparated(at);
            }
        }
        push_filter(&mut qb, filter);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn delete_tasks_matching(&self, filter: &TaskFilter) -> DomainResult<u64> {
        let mut qb = QueryBuilder::<Sqlite>::new("DELETE FROM tasks");
        push_filter(&mut qb, filter);

        let result = qb.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn select_tasks_matching(
        &self,
        filter: &TaskFilter,
    ) -> DomainResult<Vec<DomainResult<Task>>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM tasks");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at ASC, task_guid ASC");

        let rows: Vec<TaskRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Task::try_from).collect())
    }

    async fn count_tasks_by_state(&self) -> DomainResult<TaskStateCounts> {
        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT state, COUNT(*) FROM tasks GROUP BY state")
                .fetch_all(&self.pool)
                .await?;

        let mut counts = TaskStateCounts::default();
        for (state, count) in rows {
            match TaskState::from_str(&state) {
                Some(state) => counts.record(state, u64::try_from(count).unwrap_or(0)),
                None => warn!(state = %state, count, "ignoring tasks in unknown state"),
            }
        }
        Ok(counts)
    }
}

/// Append a `WHERE` clause for every populated field of `filter`.
fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &TaskFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(state) = filter.state {
        qb.push(" AND state = ").push_bind(state.as_str());
    }
    if let Some(t) = filter.created_before {
        qb.push(" AND created_at < ").push_bind(t);
    }
    if let Some(t) = filter.created_at_least {
        qb.push(" AND created_at >= ").push_bind(t);
    }
    if let Some(t) = filter.updated_before {
        qb.push(" AND updated_at < ").push_bind(t);
    }
    if let Some(t) = filter.updated_at_most {
        qb.push(" AND updated_at <= ").push_bind(t);
    }
    if let Some(t) = filter.first_completed_before {
        qb.push(" AND first_completed_at < ").push_bind(t);
    }
    if let Some(cell_ids) = filter.cell_id_not_in.as_ref().filter(|ids| !ids.is_empty()) {
        qb.push(" AND cell_id NOT IN (");
        let mut ids = qb.separated(", ");
        for id in cell_ids {
            ids.push_bind(id.clone());
        }
        ids.push_unseparated(")");
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    task_guid: String,
    domain: String,
    state: String,
    cell_id: String,
    created_at: i64,
    updated_at: i64,
    first_completed_at: i64,
    failed: bool,
    failure_reason: String,
    result: String,
    task_definition: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let state = TaskState::from_str(&row.state).ok_or_else(|| {
            DomainError::deserialize(&row.task_guid, format!("invalid state: {}", row.state))
        })?;

        let task_definition: TaskDefinition = serde_json::from_str(&row.task_definition)
            .map_err(|e| DomainError::deserialize(&row.task_guid, e))?;

        Ok(Task {
            task_guid: row.task_guid,
            domain: row.domain,
            state,
            cell_id: row.cell_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            first_completed_at: row.first_completed_at,
            failed: row.failed,
            failure_reason: row.failure_reason,
            result: row.result,
            task_definition,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_store() -> SqliteTaskStore {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteTaskStore::new(pool)
    }

    fn task(guid: &str, state: TaskState, cell_id: &str, created_at: i64) -> Task {
        let mut task = Task::new_pending(guid, "diego", TaskDefinition::default(), created_at);
        task.state = state;
        task.cell_id = cell_id.to_string();
        task
    }

    #[tokio::test]
    async fn test_insert_and_get_task() {
        let store = setup_test_store().await;
        let mut original = task("t-1", TaskState::Running, "cell-a", 10);
        original.task_definition.root_fs = "docker:///busybox".to_string();
        original.task_definition.action = serde_json::json!({"run": {"path": "echo"}});

        store.insert(&original).await.unwrap();

        let fetched = store.get("t-1").await.unwrap().unwrap();
        assert_eq!(fetched, original);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_guid_is_adapter_error() {
        let store = setup_test_store().await;
        let t = task("t-1", TaskState::Pending, "", 1);
        store.insert(&t).await.unwrap();

        let err = store.insert(&t).await.unwrap_err();
        assert!(matches!(err, DomainError::Adapter(_)));
    }

    #[tokio::test]
    async fn test_update_excludes_live_cells() {
        let store = setup_test_store().await;
        store.insert(&task("t-1", TaskState::Running, "cell-a", 1)).await.unwrap();
        store.insert(&task("t-2", TaskState::Running, "cell-b", 2)).await.unwrap();
        store.insert(&task("t-3", TaskState::Pending, "", 3)).await.unwrap();

        let filter =
            TaskFilter::in_state(TaskState::Running).cell_id_not_in(vec!["cell-a".to_string()]);
        let affected = store
            .update_tasks_matching(&filter, &TaskChanges::fail("gone", 50))
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let failed = store.get("t-2").await.unwrap().unwrap();
        assert_eq!(failed.state, TaskState::Completed);
        assert!(failed.failed);
        assert_eq!(failed.failure_reason, "gone");
        assert_eq!(failed.first_completed_at, 50);

        let untouched = store.get("t-1").await.unwrap().unwrap();
        assert_eq!(untouched.state, TaskState::Running);
    }

    #[tokio::test]
    async fn test_empty_exclusion_list_matches_every_cell() {
        let store = setup_test_store().await;
        store.insert(&task("t-1", TaskState::Running, "cell-a", 1)).await.unwrap();

        let filter = TaskFilter::in_state(TaskState::Running).cell_id_not_in(vec![]);
        let affected = store
            .update_tasks_matching(&filter, &TaskChanges::demote_to_completed())
            .await
            .unwrap();
        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_empty_changes_update_nothing() {
        let store = setup_test_store().await;
        store.insert(&task("t-1", TaskState::Pending, "", 1)).await.unwrap();

        let affected = store
            .update_tasks_matching(&TaskFilter::default(), &TaskChanges::default())
            .await
            .unwrap();
        assert_eq!(affected, 0);
    }

    #[tokio::test]
    async fn test_delete_by_first_completed_at() {
        let store = setup_test_store().await;
        let mut old = task("old", TaskState::Completed, "cell-a", 1);
        old.first_completed_at = 5;
        let mut fresh = task("fresh", TaskState::Completed, "cell-a", 1);
        fresh.first_completed_at = 20;
        store.insert(&old).await.unwrap();
        store.insert(&fresh).await.unwrap();

        let filter = TaskFilter::in_state(TaskState::Completed).first_completed_before(10);
        assert_eq!(store.delete_tasks_matching(&filter).await.unwrap(), 1);
        assert!(store.get("old").await.unwrap().is_none());
        assert!(store.get("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_select_reports_malformed_rows_individually() {
        let store = setup_test_store().await;
        store.insert(&task("good", TaskState::Pending, "", 1)).await.unwrap();
        sqlx::query(
            "INSERT INTO tasks (task_guid, domain, state, created_at, updated_at, task_definition)
             VALUES ('bad', 'diego', 'pending', 2, 2, '{not json')",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let rows = store
            .select_tasks_matching(&TaskFilter::in_state(TaskState::Pending))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].as_ref().unwrap().task_guid, "good");
        match &rows[1] {
            Err(DomainError::Deserialize { key, .. }) => assert_eq!(key, "bad"),
            other => panic!("expected deserialize error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_count_by_state() {
        let store = setup_test_store().await;
        store.insert(&task("t-1", TaskState::Pending, "", 1)).await.unwrap();
        store.insert(&task("t-2", TaskState::Pending, "", 2)).await.unwrap();
        store.insert(&task("t-3", TaskState::Resolving, "cell-a", 3)).await.unwrap();

        let counts = store.count_tasks_by_state().await.unwrap();
        assert_eq!(counts.pending, 2);
        assert_eq!(counts.running, 0);
        assert_eq!(counts.resolving, 1);
        assert_eq!(counts.total(), 3);
    }
}
