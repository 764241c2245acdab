//! Database pool setup

use ghoststream_core::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use super::catalog::CatalogResult;

/// Build a connection pool.
///
/// The pool connects lazily, so a dry run that never writes never opens a connection.
/// A malformed URL is rejected here.
pub fn connect(config: &DatabaseConfig) -> CatalogResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.timeout_seconds))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_lazy(config.url.expose())?;

    tracing::debug!(
        max_connections = config.max_connections,
        "Database pool configured"
    );

    Ok(pool)
}

/// Apply the catalog schema migrations.
pub async fn run_migrations(pool: &PgPool) -> CatalogResult<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}
