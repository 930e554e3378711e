use crate::wire::{Temperature, WirePoint};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Row};

/// Fixed decimation factor: queries return every Nth row by arrival order.
/// Policy constant, deliberately not configurable.
pub const TAKE_EVERY: i64 = 10;

/// Inserts each point as a fresh row inside the caller's transaction. No
/// dedup and no uniqueness constraint: resubmitting a batch creates
/// duplicate rows.
pub async fn insert_samples(
    conn: &mut PgConnection,
    sensor_name: &str,
    points: &[WirePoint],
) -> Result<(), sqlx::Error> {
    for point in points {
        sqlx::query(
            r#"
            INSERT INTO temperature_samples (sensor_name, sample_time, temperature)
            VALUES ($1, $2, CAST($3 AS numeric))
            "#,
        )
        .bind(sensor_name)
        .bind(point.0)
        .bind(point.1.as_ref().map(Temperature::as_str))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Every `TAKE_EVERY`th sample by ascending id (canonical arrival order,
/// independent of `sample_time`), computed over the sensor's full history
/// and only then filtered to `sample_time > start`. Result is ordered by
/// `sample_time` ascending.
///
/// A sensor with fewer than `TAKE_EVERY` rows yields nothing: row_number
/// never reaches a multiple of the factor.
pub async fn decimated_series(
    pool: &PgPool,
    sensor_name: &str,
    start: Option<DateTime<Utc>>,
) -> Result<Vec<WirePoint>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT sample_time, temperature::text AS temperature
        FROM (
            SELECT
                sample_time, temperature,
                row_number() OVER (ORDER BY id ASC) AS arrival
            FROM temperature_samples
            WHERE sensor_name = $1
        ) ranked
        WHERE ranked.arrival % $2 = 0
          AND ($3::timestamptz IS NULL OR ranked.sample_time > $3)
        ORDER BY ranked.sample_time ASC
        "#,
    )
    .bind(sensor_name)
    .bind(TAKE_EVERY)
    .bind(start)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            let sample_time: DateTime<Utc> = row.try_get("sample_time")?;
            let temperature: Option<String> = row.try_get("temperature")?;
            Ok(WirePoint(sample_time, temperature.map(Temperature::from_db)))
        })
        .collect()
}
