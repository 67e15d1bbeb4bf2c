//! Data version persisted as JSON in the `configurations` table.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Version;
use crate::domain::ports::VersionStore;

const VERSION_ID: &str = "version";

#[derive(Clone)]
pub struct SqliteVersionStore {
    pool: SqlitePool,
}

impl SqliteVersionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VersionStore for SqliteVersionStore {
    async fn set_version(&self, version: &Version) -> DomainResult<()> {
        let value = serde_json::to_string(version)
            .map_err(|e| DomainError::Adapter(format!("cannot encode version: {e}")))?;

        sqlx::query(
            "INSERT INTO configurations (id, value) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET value = excluded.value",
        )
        .bind(VERSION_ID)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn version(&self) -> DomainResult<Version> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM configurations WHERE id = ?")
            .bind(VERSION_ID)
            .fetch_optional(&self.pool)
            .await?;

        let (value,) = row.ok_or_else(|| DomainError::NotFound(VERSION_ID.to_string()))?;
        serde_json::from_str(&value).map_err(|e| DomainError::deserialize(VERSION_ID, e))
    }
}
