// src/config/db.rs
// DOCUMENTATION: Database connection pool initialization
// PURPOSE: Setup PostgreSQL connection pool and the photos collection

use crate::config::Config;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Initialize PostgreSQL connection pool
/// DOCUMENTATION: Creates connection pool and makes sure the photos table exists
/// Called once during application startup in main.rs
pub async fn init_db_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    log::info!("Initializing database pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connection_timeout))
        // Connection idle timeout (5 minutes)
        .idle_timeout(Duration::from_secs(300))
        // Connection lifetime (30 minutes before recycle)
        .max_lifetime(Duration::from_secs(1800))
        .connect(&config.database_url)
        .await?;

    sqlx::query("SELECT 1").execute(&pool).await?;
    ensure_schema(&pool).await?;

    log::info!("Database pool initialized successfully");
    Ok(pool)
}

/// Create the photos collection when missing
/// `timestamp` is assigned by the server on insert; `seq` orders inserts within one timestamp
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS photos (
            id UUID PRIMARY KEY,
            seq BIGSERIAL NOT NULL,
            url TEXT NOT NULL,
            name TEXT NOT NULL,
            timestamp TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Tables created before `seq` existed get it backfilled
    sqlx::query("ALTER TABLE photos ADD COLUMN IF NOT EXISTS seq BIGSERIAL")
        .execute(pool)
        .await?;

    sqlx::query("DROP INDEX IF EXISTS photos_timestamp_idx")
        .execute(pool)
        .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS photos_timestamp_seq_idx ON photos (timestamp DESC, seq DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
