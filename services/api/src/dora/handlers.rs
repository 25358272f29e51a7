use axum::extract::State;
use axum::Json;
use chrono::Utc;
use qlens_metrics::deployments::RegisterDeploymentRequest;
use qlens_metrics::dora::DoraSummary;

use crate::dora::requests::WindowParams;
use crate::dora::responses::{DeploymentListResponse, RegisterDeploymentResponse};
use crate::error::ApiError;
use crate::extractors::{SelectedProject, ValidJson, ValidQuery};
use crate::AppState;

pub async fn register_deployment(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<RegisterDeploymentRequest>,
) -> Result<Json<RegisterDeploymentResponse>, ApiError> {
    let deployment = state.recorder.register(body).await?;
    Ok(Json(RegisterDeploymentResponse {
        message: "Deployment registered successfully",
        deployment,
    }))
}

pub async fn get_dora_metrics(
    State(state): State<AppState>,
    SelectedProject(project): SelectedProject,
    ValidQuery(params): ValidQuery<WindowParams>,
) -> Result<Json<DoraSummary>, ApiError> {
    let summary = state
        .dora
        .summarize(&project.sonar_key, params.days())
        .await?;
    Ok(Json(summary))
}

pub async fn list_deployments(
    State(state): State<AppState>,
    SelectedProject(project): SelectedProject,
    ValidQuery(params): ValidQuery<WindowParams>,
) -> Result<Json<DeploymentListResponse>, ApiError> {
    let days = params.days();
    let deployments = state
        .dora
        .deployments_in_window(&project.sonar_key, days, Utc::now())
        .await?;

    Ok(Json(DeploymentListResponse {
        project_key: project.sonar_key,
        period: format!("{days} days"),
        count: deployments.len(),
        deployments,
    }))
}
