use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::quality::models::QualityMetricSnapshot;
use qlens_common::error::QlensResult;

#[async_trait]
pub trait QualityMetricsRepository: Send + Sync {
    async fn insert_snapshot(&self, snapshot: QualityMetricSnapshot)
        -> QlensResult<QualityMetricSnapshot>;

    /// Newest snapshot for the project by timestamp.
    async fn get_latest(&self, project_key: &str) -> QlensResult<Option<QualityMetricSnapshot>>;

    /// Snapshots at or after `since`, newest first.
    async fn list_since(
        &self,
        project_key: &str,
        since: DateTime<Utc>,
    ) -> QlensResult<Vec<QualityMetricSnapshot>>;

    /// Delete all but the newest `keep` snapshots for the project.
    /// Returns the number of rows removed.
    async fn trim(&self, project_key: &str, keep: usize) -> QlensResult<u64>;
}
