use crate::store;
use crate::wire::WirePoint;
use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use sqlx::PgPool;
use std::path::Path;

/// Exports the decimated series for one sensor, over its full history, to a
/// CSV file. Timestamps are rendered in the server's local timezone.
pub async fn run(pool: &PgPool, sensor_name: &str, outfile: &Path) -> Result<()> {
    let points = store::decimated_series(pool, sensor_name, None)
        .await
        .with_context(|| format!("query series for {sensor_name}"))?;

    write_csv(&points, outfile)?;

    tracing::info!(
        sensor = %sensor_name,
        rows = points.len(),
        path = %outfile.display(),
        "wrote csv export"
    );
    Ok(())
}

fn write_csv(points: &[WirePoint], outfile: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(outfile)
        .with_context(|| format!("open {} for writing", outfile.display()))?;
    writer.write_record(["Time", "Temperature"])?;
    for point in points {
        writer.write_record([
            render_local_time(point.0).as_str(),
            point.1.as_ref().map(|t| t.as_str()).unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn render_local_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}
