//! Best-effort retention trimming run after each write.

use qlens_db::dora::repositories::DeploymentRepository;
use qlens_db::quality::repositories::QualityMetricsRepository;

pub const DEFAULT_METRICS_RETENTION: usize = 1000;
pub const DEFAULT_DEPLOYMENTS_RETENTION: usize = 500;

/// Keep the newest `keep` snapshots. Failures are logged and reported as 0.
pub async fn trim_snapshots(
    repo: &dyn QualityMetricsRepository,
    project_key: &str,
    keep: usize,
) -> u64 {
    match repo.trim(project_key, keep).await {
        Ok(deleted) => {
            if deleted > 0 {
                tracing::info!(project = project_key, deleted, "trimmed old snapshots");
            }
            deleted
        }
        Err(e) => {
            tracing::warn!(project = project_key, error = %e, "snapshot trim failed");
            0
        }
    }
}

/// Keep the newest `keep` deployments. Failures are logged and reported as 0.
pub async fn trim_deployments(
    repo: &dyn DeploymentRepository,
    project_key: &str,
    keep: usize,
) -> u64 {
    match repo.trim(project_key, keep).await {
        Ok(deleted) => {
            if deleted > 0 {
                tracing::info!(project = project_key, deleted, "trimmed old deployments");
            }
            deleted
        }
        Err(e) => {
            tracing::warn!(project = project_key, error = %e, "deployment trim failed");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use qlens_common::error::{QlensError, QlensResult};
    use qlens_db::quality::file_repository::FileQualityMetricsRepository;
    use qlens_db::quality::models::QualityMetricSnapshot;

    struct BrokenRepo;

    #[async_trait]
    impl QualityMetricsRepository for BrokenRepo {
        async fn insert_snapshot(
            &self,
            _snapshot: QualityMetricSnapshot,
        ) -> QlensResult<QualityMetricSnapshot> {
            Err(QlensError::Database("down".to_string()))
        }

        async fn get_latest(&self, _project_key: &str) -> QlensResult<Option<QualityMetricSnapshot>> {
            Err(QlensError::Database("down".to_string()))
        }

        async fn list_since(
            &self,
            _project_key: &str,
            _since: DateTime<Utc>,
        ) -> QlensResult<Vec<QualityMetricSnapshot>> {
            Err(QlensError::Database("down".to_string()))
        }

        async fn trim(&self, _project_key: &str, _keep: usize) -> QlensResult<u64> {
            Err(QlensError::Database("down".to_string()))
        }
    }

    #[tokio::test]
    async fn trim_failure_is_swallowed() {
        assert_eq!(trim_snapshots(&BrokenRepo, "p", 10).await, 0);
    }

    #[tokio::test]
    async fn trim_reports_deleted_count() {
        let dir = tempfile::tempdir().unwrap();
        let repo = FileQualityMetricsRepository::new(dir.path());
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        for m in 0..5 {
            repo.insert_snapshot(QualityMetricSnapshot::empty("p", base + Duration::minutes(m)))
                .await
                .unwrap();
        }

        assert_eq!(trim_snapshots(&repo, "p", 2).await, 3);
        assert_eq!(trim_snapshots(&repo, "p", 2).await, 0);
    }
}
