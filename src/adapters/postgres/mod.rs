//! PostgreSQL adapters - Database implementations for the event store port.
//!
//! - `PostgresEventStore` - Event log over a shared `PgPool`
//! - `connect` - Builds the pool from `DatabaseConfig`
//! - `run_migrations` - Applies `migrations/` when enabled in config

mod event_store;

pub use event_store::PostgresEventStore;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::DatabaseConfig;
use crate::ports::RepositoryError;

/// Opens a connection pool using the configured limits.
#[tracing::instrument(skip(config), fields(max_connections = config.max_connections))]
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, RepositoryError> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.url)
        .await
        .map_err(|e| RepositoryError::Connection(e.to_string()))?;

    tracing::info!("connected to postgres");
    Ok(pool)
}

/// Applies pending schema migrations.
#[tracing::instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| RepositoryError::Migration(e.to_string()))?;

    tracing::info!("migrations applied");
    Ok(())
}
