//! SQLite-backed hierarchical store: one `nodes` row per leaf key.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::DomainResult;
use crate::domain::models::tree::normalize_key;
use crate::domain::models::TreeNode;
use crate::domain::ports::TreeStore;

#[derive(Clone)]
pub struct SqliteTreeStore {
    pool: SqlitePool,
}

impl SqliteTreeStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert or replace the leaf stored at `key`.
    pub async fn put(&self, key: &str, value: &str) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO nodes (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(normalize_key(key))
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Remove `key` and everything below it, returning the number of leaves removed.
    pub async fn delete(&self, key: &str) -> DomainResult<u64> {
        let key = normalize_key(key);
        let result = if key == "/" {
            sqlx::query("DELETE FROM nodes").execute(&self.pool).await?
        } else {
            let (lower, upper) = descendant_range(&key);
            sqlx::query("DELETE FROM nodes WHERE key = ? OR (key >= ? AND key < ?)")
                .bind(&key)
                .bind(lower)
                .bind(upper)
                .execute(&self.pool)
                .await?
        };
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl TreeStore for SqliteTreeStore {
    async fn fetch_subtree(&self, path: &str) -> DomainResult<Option<TreeNode>> {
        let root = normalize_key(path);
        let entries: Vec<(String, String)> = if root == "/" {
            sqlx::query_as("SELECT key, value FROM nodes ORDER BY key")
                .fetch_all(&self.pool)
                .await?
        } else {
            let (lower, upper) = descendant_range(&root);
            sqlx::query_as(
                "SELECT key, value FROM nodes WHERE key = ? OR (key >= ? AND key < ?) ORDER BY key",
            )
            .bind(&root)
            .bind(lower)
            .bind(upper)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(TreeNode::from_entries(&root, entries))
    }
}

/// Half-open key range `[key/, key0)` covering every descendant of `key`.
fn descendant_range(key: &str) -> (String, String) {
    // '0' is the byte right after '/'.
    (format!("{key}/"), format!("{key}0"))
}
