//! Database Module
//!
//! PostgreSQL connection pool and embedded migrations.

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, instrument};

use crate::config::DatabaseSettings;

/// Create a PostgreSQL connection pool
#[instrument(skip(settings), fields(max_connections = settings.max_connections))]
pub async fn create_pool(settings: &DatabaseSettings) -> Result<PgPool, sqlx::Error> {
    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout))
        .connect(&settings.url)
        .await?;
    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Round-trip query used by the readiness probe
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
