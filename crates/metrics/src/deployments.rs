use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use qlens_common::error::{QlensError, QlensResult};
use qlens_db::dora::models::{DeploymentEvent, DeploymentStatus};
use qlens_db::dora::repositories::DeploymentRepository;

use crate::retention::{trim_deployments, DEFAULT_DEPLOYMENTS_RETENTION};

pub const DEFAULT_ENVIRONMENT: &str = "production";
pub const DEFAULT_BRANCH: &str = "main";

/// Body of `POST /api/dora/deployment`, as sent by CI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeploymentRequest {
    pub project_key: Option<String>,
    pub commit_sha: Option<String>,
    pub commit_timestamp: Option<String>,
    pub deployment_timestamp: Option<String>,
    pub environment: Option<String>,
    pub status: Option<String>,
    pub branch: Option<String>,
    pub lead_time_minutes: Option<i64>,
    pub metadata: Option<serde_json::Value>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_timestamp(field: &str, raw: &str) -> QlensResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| QlensError::Validation(format!("{field} is not an RFC 3339 timestamp: {e}")))
}

/// Minutes between commit and deployment, rounded to the nearest minute.
pub fn lead_time_minutes(commit: DateTime<Utc>, deployed: DateTime<Utc>) -> i64 {
    ((deployed - commit).num_milliseconds() as f64 / 60_000.0).round() as i64
}

impl RegisterDeploymentRequest {
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("projectKey", &self.project_key),
            ("commitSha", &self.commit_sha),
            ("commitTimestamp", &self.commit_timestamp),
            ("deploymentTimestamp", &self.deployment_timestamp),
        ]
        .into_iter()
        .filter(|(_, value)| present(value).is_none())
        .map(|(name, _)| name)
        .collect()
    }

    /// Validate and fill defaults. Every missing required field is reported
    /// in one error.
    pub fn into_event(self, now: DateTime<Utc>) -> QlensResult<DeploymentEvent> {
        let (Some(project_key), Some(commit_sha), Some(commit_raw), Some(deploy_raw)) = (
            present(&self.project_key),
            present(&self.commit_sha),
            present(&self.commit_timestamp),
            present(&self.deployment_timestamp),
        ) else {
            return Err(QlensError::Validation(format!(
                "missing required fields: {}",
                self.missing_fields().join(", ")
            )));
        };

        let commit_timestamp = parse_timestamp("commitTimestamp", commit_raw)?;
        let deployment_timestamp = parse_timestamp("deploymentTimestamp", deploy_raw)?;

        let status = match present(&self.status) {
            Some(raw) => raw.parse::<DeploymentStatus>()?,
            None => DeploymentStatus::default(),
        };

        Ok(DeploymentEvent {
            id: Uuid::new_v4(),
            project_key: project_key.to_owned(),
            commit_sha: commit_sha.to_owned(),
            commit_timestamp,
            deployment_timestamp,
            environment: present(&self.environment)
                .unwrap_or(DEFAULT_ENVIRONMENT)
                .to_owned(),
            status,
            branch: present(&self.branch).unwrap_or(DEFAULT_BRANCH).to_owned(),
            lead_time_minutes: self
                .lead_time_minutes
                .unwrap_or_else(|| lead_time_minutes(commit_timestamp, deployment_timestamp)),
            metadata: self.metadata,
            created_at: now,
        })
    }
}

/// Validates, stores, and trims deployment events.
pub struct DeploymentRecorder {
    repo: Arc<dyn DeploymentRepository>,
    retention: usize,
}

impl DeploymentRecorder {
    pub fn new(repo: Arc<dyn DeploymentRepository>) -> Self {
        Self {
            repo,
            retention: DEFAULT_DEPLOYMENTS_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    pub async fn register(&self, request: RegisterDeploymentRequest) -> QlensResult<DeploymentEvent> {
        let event = request.into_event(Utc::now())?;
        let saved = self.repo.insert_deployment(event).await?;

        tracing::info!(
            project = %saved.project_key,
            commit = %saved.commit_sha,
            status = %saved.status,
            lead_time_minutes = saved.lead_time_minutes,
            "deployment registered"
        );

        trim_deployments(self.repo.as_ref(), &saved.project_key, self.retention).await;
        Ok(saved)
    }
}
