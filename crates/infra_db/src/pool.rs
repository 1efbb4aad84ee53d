//! Connection pool and migrations

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use core_kernel::PortError;

use crate::error::db_error;

/// Opens a pool against the given database URL
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, PortError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .map_err(db_error)?;
    info!(max_connections, "database pool ready");
    Ok(pool)
}

/// Applies the embedded migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), PortError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| PortError::Internal {
            message: "migration failed".into(),
            source: Some(Box::new(e)),
        })?;
    info!("migrations applied");
    Ok(())
}
