use crate::error::map_db_error;
use crate::state::AppState;
use crate::store;
use crate::wire::{IncomingPoint, WirePoint};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer};

pub const DEFAULT_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    #[serde(default, deserialize_with = "lenient_days")]
    pub days: Option<i64>,
}

/// `?days=abc` falls back to the default window instead of rejecting the
/// request.
fn lenient_days<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.trim().parse().ok()))
}

/// Window start for a `?days=N` query. Out-of-range values fall back to the
/// default rather than panicking chrono's duration arithmetic.
pub fn start_for_days(now: DateTime<Utc>, days: Option<i64>) -> DateTime<Utc> {
    let days = days.unwrap_or(DEFAULT_DAYS);
    let window = Duration::try_days(days).unwrap_or_else(|| Duration::days(DEFAULT_DAYS));
    now - window
}

async fn get_series(
    State(state): State<AppState>,
    Path(sensor_name): Path<String>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<WirePoint>>, (StatusCode, String)> {
    let start = start_for_days(Utc::now(), range.days);
    let points = store::decimated_series(&state.db, &sensor_name, Some(start))
        .await
        .map_err(map_db_error)?;
    Ok(Json(points))
}

async fn ingest_batch(
    State(state): State<AppState>,
    Path(sensor_name): Path<String>,
    Json(payload): Json<Vec<IncomingPoint>>,
) -> Result<&'static str, (StatusCode, String)> {
    let mut points = Vec::with_capacity(payload.len());
    for raw in payload {
        // One bad pair rejects the whole batch; nothing has been written yet.
        let point = raw
            .into_point()
            .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?;
        points.push(point);
    }

    let mut tx = state.db.begin().await.map_err(map_db_error)?;
    store::insert_samples(&mut tx, &sensor_name, &points)
        .await
        .map_err(map_db_error)?;
    tx.commit().await.map_err(map_db_error)?;

    tracing::debug!(sensor = %sensor_name, count = points.len(), "ingested batch");
    Ok("OK")
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{sensor_name}", get(get_series).post(ingest_batch))
}
