pub mod handlers;
pub mod responses;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/projects", get(handlers::list_projects))
}
