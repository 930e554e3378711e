pub mod api;
pub mod graph;
pub mod health;

use crate::state::AppState;
use axum::Router;
use tower_http::cors::CorsLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(graph::router())
        .nest("/api", api::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
