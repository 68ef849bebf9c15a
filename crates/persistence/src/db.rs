//! Database connection pool management.

use sqlx::postgres::PgPoolOptions;
use sqlx::{Executor, PgPool};
use std::time::Duration;

/// Database configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Bounded wait for a pooled connection. Exceeding it surfaces as `Unavailable`.
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    /// Applied to every connection with `SET statement_timeout`. Zero disables it.
    pub statement_timeout_ms: u64,
}

/// Creates a PostgreSQL connection pool with the given configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let statement_timeout_ms = config.statement_timeout_ms;

    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                if statement_timeout_ms > 0 {
                    let stmt = format!("SET statement_timeout = {}", statement_timeout_ms);
                    conn.execute(stmt.as_str()).await?;
                }
                Ok(())
            })
        })
        .connect(&config.url)
        .await
}

/// Round-trips a trivial query, returning the latency in milliseconds.
pub async fn ping(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let start = std::time::Instant::now();
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(start.elapsed().as_millis() as u64)
}
