use std::time::Duration;

use sqlx::PgPool;
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPoolOptions;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!();

const MAX_CONNECTIONS: u32 = 20;
const MIN_CONNECTIONS: u32 = 5;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .min_connections(MIN_CONNECTIONS)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await?;
    info!(
        max_connections = MAX_CONNECTIONS,
        min_connections = MIN_CONNECTIONS,
        "postgres pool ready"
    );
    Ok(pool)
}

/// Applies the embedded schema; versions already recorded are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await?;
    info!(known_migrations = MIGRATOR.iter().count(), "schema up to date");
    Ok(())
}
