use qlens_db::dora::models::DeploymentEvent;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RegisterDeploymentResponse {
    pub message: &'static str,
    pub deployment: DeploymentEvent,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentListResponse {
    pub project_key: String,
    pub period: String,
    pub count: usize,
    pub deployments: Vec<DeploymentEvent>,
}
