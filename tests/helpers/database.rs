use sqlx::SqlitePool;

use bulletin::adapters::sqlite::create_migrated_test_pool;

/// Create an in-memory SQLite database for testing
///
/// Each call creates a completely isolated database with the schema applied.
pub async fn setup_test_db() -> SqlitePool {
    create_migrated_test_pool()
        .await
        .expect("failed to create test database")
}

/// Close the pool at the end of a test.
pub async fn teardown_test_db(pool: SqlitePool) {
    pool.close().await;
}
