use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

pub fn connect_lazy(database_url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(8))
        .connect_lazy(database_url)
        .with_context(|| format!("failed to create lazy database pool for {database_url}"))
}

/// Single append-only table; `id` defines canonical arrival order. No
/// migration framework in scope.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS temperature_samples (
            id BIGSERIAL PRIMARY KEY,
            sensor_name TEXT NOT NULL,
            sample_time TIMESTAMPTZ NOT NULL,
            temperature NUMERIC
        )
        "#,
    )
    .execute(pool)
    .await
    .context("create temperature_samples table")?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS temperature_samples_sensor_time_idx
        ON temperature_samples (sensor_name, sample_time)
        "#,
    )
    .execute(pool)
    .await
    .context("create temperature_samples index")?;

    Ok(())
}
