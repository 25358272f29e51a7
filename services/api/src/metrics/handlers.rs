use axum::extract::State;
use axum::Json;
use chrono::Utc;
use qlens_common::error::{QlensError, QlensResult};
use qlens_db::quality::models::QualityMetricSnapshot;
use qlens_metrics::gate::{self, QualityGate};

use crate::error::ApiError;
use crate::extractors::{SelectedProject, ValidQuery};
use crate::metrics::requests::HistoryParams;
use crate::metrics::responses::CollectResponse;
use crate::AppState;

async fn latest_snapshot(
    state: &AppState,
    project: &SelectedProject,
) -> QlensResult<QualityMetricSnapshot> {
    let SelectedProject(project) = project;
    state
        .storage
        .quality
        .get_latest(&project.sonar_key)
        .await?
        .ok_or_else(|| {
            QlensError::NotFound(format!(
                "no metrics data available for {}, wait for the first collection cycle to complete",
                project.id
            ))
        })
}

pub async fn get_latest_metrics(
    State(state): State<AppState>,
    project: SelectedProject,
) -> Result<Json<QualityMetricSnapshot>, ApiError> {
    Ok(Json(latest_snapshot(&state, &project).await?))
}

pub async fn list_metrics_history(
    State(state): State<AppState>,
    SelectedProject(project): SelectedProject,
    ValidQuery(params): ValidQuery<HistoryParams>,
) -> Result<Json<Vec<QualityMetricSnapshot>>, ApiError> {
    let since = params.since(Utc::now());
    let snapshots = state
        .storage
        .quality
        .list_since(&project.sonar_key, since)
        .await?;
    Ok(Json(snapshots))
}

pub async fn get_quality_gate(
    State(state): State<AppState>,
    project: SelectedProject,
) -> Result<Json<QualityGate>, ApiError> {
    let snapshot = latest_snapshot(&state, &project).await?;
    Ok(Json(gate::evaluate(&snapshot)))
}

pub async fn trigger_collection(State(state): State<AppState>) -> Json<CollectResponse> {
    tracing::info!("manual collection triggered");
    let report = state.collector.run_cycle().await;
    Json(CollectResponse {
        message: "Metrics collection triggered successfully",
        report,
    })
}
