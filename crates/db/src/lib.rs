pub mod dora;
pub mod json_file;
pub mod quality;
pub mod retry;
pub mod schema;
pub mod storage;

use qlens_common::error::{QlensError, QlensResult};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Create a Postgres connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> QlensResult<PgPool> {
    tracing::info!("connecting to database");
    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect(database_url)
        .await
        .map_err(|e| QlensError::Database(e.to_string()))
}
