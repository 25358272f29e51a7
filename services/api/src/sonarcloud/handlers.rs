use axum::extract::State;
use axum::Json;
use qlens_common::error::QlensError;
use qlens_sonarcloud::details::{ComplexityReport, CoverageReport, HotspotReport, NewCodeIssues};

use crate::error::ApiError;
use crate::extractors::SelectedProject;
use crate::AppState;

pub async fn get_new_code_issues(
    State(state): State<AppState>,
    SelectedProject(project): SelectedProject,
) -> Result<Json<NewCodeIssues>, ApiError> {
    let issues = state
        .sonarcloud
        .new_code_issues(&project.sonar_key)
        .await
        .map_err(QlensError::from)?;
    Ok(Json(issues))
}

pub async fn get_complexity(
    State(state): State<AppState>,
    SelectedProject(project): SelectedProject,
) -> Result<Json<ComplexityReport>, ApiError> {
    let report = state
        .sonarcloud
        .complexity_by_file(&project.sonar_key)
        .await
        .map_err(QlensError::from)?;
    Ok(Json(report))
}

pub async fn get_coverage_by_file(
    State(state): State<AppState>,
    SelectedProject(project): SelectedProject,
) -> Result<Json<CoverageReport>, ApiError> {
    let report = state
        .sonarcloud
        .coverage_by_file(&project.sonar_key)
        .await
        .map_err(QlensError::from)?;
    Ok(Json(report))
}

// Never fails; hotspot access is optional on the upstream side.
pub async fn get_security_hotspots(
    State(state): State<AppState>,
    SelectedProject(project): SelectedProject,
) -> Json<HotspotReport> {
    Json(state.sonarcloud.security_hotspots(&project.sonar_key).await)
}
