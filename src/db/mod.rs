pub mod profile_cache;

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::AppError;

/// Opens the local state database and brings its schema up to date.
pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    // A single connection keeps `sqlite::memory:` databases shared across queries.
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
