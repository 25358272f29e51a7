use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use qlens_common::error::QlensResult;
use qlens_db::dora::models::{DeploymentEvent, DeploymentFilter, DeploymentStatus};
use qlens_db::dora::repositories::DeploymentRepository;

use super::classify::{duration_tier, failure_rate_tier, frequency_tier, Tier};
use super::compute::{
    change_failure_rate, mean, mean_time_to_restore, percentile, successful_lead_times,
};
use crate::round2;

pub const DEFAULT_DAYS: u32 = 30;
const MINUTES: &str = "minutes";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub days: u32,
    pub first_deployment: Option<DateTime<Utc>>,
    pub last_deployment: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentFrequency {
    pub total: usize,
    pub per_day: Option<f64>,
    pub tier: Option<Tier>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeadTime {
    pub average: Option<f64>,
    pub median: Option<f64>,
    pub unit: &'static str,
    pub tier: Option<Tier>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeFailureRate {
    pub rate: Option<f64>,
    pub failures: usize,
    pub total: usize,
    pub tier: Option<Tier>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeanTimeToRestore {
    pub average: Option<f64>,
    pub unit: &'static str,
    pub tier: Option<Tier>,
}

/// DORA metrics for one project over a trailing window of days.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoraSummary {
    pub project_key: String,
    pub period: Period,
    pub deployment_frequency: DeploymentFrequency,
    pub lead_time: LeadTime,
    pub change_failure_rate: ChangeFailureRate,
    pub mean_time_to_restore: MeanTimeToRestore,
    pub total_deployments: usize,
    pub successful_deployments: usize,
    pub failed_deployments: usize,
}

/// Aggregate deployments that already fall inside the window.
pub fn summarize_deployments(
    project_key: &str,
    days: u32,
    deployments: &[DeploymentEvent],
) -> DoraSummary {
    let total = deployments.len();
    let failed = deployments
        .iter()
        .filter(|d| d.status == DeploymentStatus::Failure)
        .count();

    let per_day = if total > 0 && days > 0 {
        Some(round2(total as f64 / f64::from(days)))
    } else {
        None
    };

    let lead_times = successful_lead_times(deployments);
    let lead_average = mean(&lead_times).map(round2);
    let lead_median = percentile(&lead_times, 50.0).map(round2);

    let cfr = change_failure_rate(failed, total);
    let mttr = mean_time_to_restore(deployments);

    DoraSummary {
        project_key: project_key.to_owned(),
        period: Period {
            days,
            first_deployment: deployments.iter().map(|d| d.deployment_timestamp).min(),
            last_deployment: deployments.iter().map(|d| d.deployment_timestamp).max(),
        },
        deployment_frequency: DeploymentFrequency {
            total,
            per_day,
            tier: per_day.map(frequency_tier),
        },
        lead_time: LeadTime {
            average: lead_average,
            median: lead_median,
            unit: MINUTES,
            tier: lead_average.map(duration_tier),
        },
        change_failure_rate: ChangeFailureRate {
            rate: cfr,
            failures: failed,
            total,
            tier: cfr.map(failure_rate_tier),
        },
        mean_time_to_restore: MeanTimeToRestore {
            average: mttr,
            unit: MINUTES,
            tier: mttr.map(duration_tier),
        },
        total_deployments: total,
        successful_deployments: total - failed,
        failed_deployments: failed,
    }
}

/// `now - days`, or `None` (no lower bound) when that falls outside the
/// representable date range.
pub fn window_start(now: DateTime<Utc>, days: u32) -> Option<DateTime<Utc>> {
    Duration::try_days(i64::from(days)).and_then(|d| now.checked_sub_signed(d))
}

pub struct DoraService {
    repo: Arc<dyn DeploymentRepository>,
}

impl DoraService {
    pub fn new(repo: Arc<dyn DeploymentRepository>) -> Self {
        Self { repo }
    }

    /// Deployments with a deployment timestamp in `[now - days, now]`,
    /// newest first.
    pub async fn deployments_in_window(
        &self,
        project_key: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> QlensResult<Vec<DeploymentEvent>> {
        let filter = DeploymentFilter {
            project_key: project_key.to_owned(),
            since: window_start(now, days),
            until: Some(now),
        };
        self.repo.list_deployments(filter).await
    }

    pub async fn summarize(&self, project_key: &str, days: u32) -> QlensResult<DoraSummary> {
        self.summarize_at(project_key, days, Utc::now()).await
    }

    pub async fn summarize_at(
        &self,
        project_key: &str,
        days: u32,
        now: DateTime<Utc>,
    ) -> QlensResult<DoraSummary> {
        let deployments = self.deployments_in_window(project_key, days, now).await?;
        tracing::debug!(
            project = project_key,
            days,
            count = deployments.len(),
            "computing dora summary"
        );
        Ok(summarize_deployments(project_key, days, &deployments))
    }
}
