use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

use crate::json_file::{retain_newest, JsonFile};
use crate::quality::models::QualityMetricSnapshot;
use crate::quality::repositories::QualityMetricsRepository;
use qlens_common::error::QlensResult;

pub const METRICS_FILE: &str = "metrics.json";

/// Snapshots kept as one JSON array in `<data_dir>/metrics.json`.
pub struct FileQualityMetricsRepository {
    file: JsonFile<QualityMetricSnapshot>,
}

impl FileQualityMetricsRepository {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file: JsonFile::new(data_dir.join(METRICS_FILE)),
        }
    }
}

#[async_trait]
impl QualityMetricsRepository for FileQualityMetricsRepository {
    async fn insert_snapshot(
        &self,
        snapshot: QualityMetricSnapshot,
    ) -> QlensResult<QualityMetricSnapshot> {
        let saved = snapshot.clone();
        self.file.update(move |items| items.push(snapshot)).await?;
        Ok(saved)
    }

    async fn get_latest(&self, project_key: &str) -> QlensResult<Option<QualityMetricSnapshot>> {
        let items = self.file.read().await?;
        Ok(items
            .into_iter()
            .filter(|s| s.project_key == project_key)
            .max_by_key(|s| s.timestamp))
    }

    async fn list_since(
        &self,
        project_key: &str,
        since: DateTime<Utc>,
    ) -> QlensResult<Vec<QualityMetricSnapshot>> {
        let mut items: Vec<_> = self
            .file
            .read()
            .await?
            .into_iter()
            .filter(|s| s.project_key == project_key && s.timestamp >= since)
            .collect();
        items.reverse();
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(items)
    }

    async fn trim(&self, project_key: &str, keep: usize) -> QlensResult<u64> {
        let removed = self
            .file
            .update(|items| {
                retain_newest(items, keep, |s| s.project_key == project_key, |s| s.timestamp)
            })
            .await?;
        Ok(removed as u64)
    }
}
