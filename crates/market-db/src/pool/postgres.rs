//! PostgreSQL connection pool management

use std::path::Path;
use std::time::Duration;

use market_common::DatabaseConfig;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

/// Maximum time to wait for a connection
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);
/// Maximum idle time before a connection is closed
const IDLE_TIMEOUT: Duration = Duration::from_secs(300);
/// Maximum lifetime of a connection
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// Create a new PostgreSQL connection pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections.min(config.max_connections))
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .max_lifetime(MAX_LIFETIME)
        .connect(&config.url)
        .await
}

/// Apply every pending migration from this crate's `migrations/` directory
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let migrator = Migrator::new(dir.as_path()).await?;
    migrator.run(pool).await?;

    info!(count = migrator.iter().count(), "Database migrations applied");
    Ok(())
}
