pub mod handlers;
pub mod requests;
pub mod responses;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/metrics/latest", get(handlers::get_latest_metrics))
        .route("/api/metrics/history", get(handlers::list_metrics_history))
        .route("/api/metrics/quality-gate", get(handlers::get_quality_gate))
        .route("/api/metrics/collect", post(handlers::trigger_collection))
}
