pub mod handlers;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/sonarcloud/new-code-issues", get(handlers::get_new_code_issues))
        .route("/api/sonarcloud/complexity", get(handlers::get_complexity))
        .route("/api/sonarcloud/coverage-by-file", get(handlers::get_coverage_by_file))
        .route("/api/sonarcloud/security-hotspots", get(handlers::get_security_hotspots))
}
