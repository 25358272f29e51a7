pub mod handlers;
pub mod requests;
pub mod responses;

use axum::routing::{get, post};
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/dora/deployment", post(handlers::register_deployment))
        .route("/api/dora/metrics", get(handlers::get_dora_metrics))
        .route("/api/dora/deployments", get(handlers::list_deployments))
}
