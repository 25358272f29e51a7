use axum::extract::State;
use axum::Json;

use crate::projects::responses::{ProjectListResponse, ProjectSummary};
use crate::AppState;

pub async fn list_projects(State(state): State<AppState>) -> Json<ProjectListResponse> {
    Json(ProjectListResponse {
        projects: state.projects.all().iter().map(ProjectSummary::from).collect(),
        default: state.projects.default_id().to_owned(),
    })
}
