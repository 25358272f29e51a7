use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use qlens_common::error::QlensError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    #[default]
    Success,
    Failure,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Success => "success",
            DeploymentStatus::Failure => "failure",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeploymentStatus {
    type Err = QlensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(DeploymentStatus::Success),
            "failure" => Ok(DeploymentStatus::Failure),
            other => Err(QlensError::Validation(format!(
                "invalid status {other:?}, expected success or failure"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentEvent {
    pub id: Uuid,
    pub project_key: String,
    pub commit_sha: String,
    pub commit_timestamp: DateTime<Utc>,
    pub deployment_timestamp: DateTime<Utc>,
    pub environment: String,
    pub status: DeploymentStatus,
    pub branch: String,
    pub lead_time_minutes: i64,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Deployments for one project with `since <= deployment_timestamp <= until`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentFilter {
    pub project_key: String,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DeploymentFilter {
    pub fn for_project(project_key: &str) -> Self {
        Self {
            project_key: project_key.to_owned(),
            since: None,
            until: None,
        }
    }

    pub fn matches(&self, deployment: &DeploymentEvent) -> bool {
        deployment.project_key == self.project_key
            && self
                .since
                .map_or(true, |since| deployment.deployment_timestamp >= since)
            && self
                .until
                .map_or(true, |until| deployment.deployment_timestamp <= until)
    }
}
