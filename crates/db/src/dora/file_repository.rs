use async_trait::async_trait;
use std::path::Path;

use crate::dora::models::{DeploymentEvent, DeploymentFilter};
use crate::dora::repositories::DeploymentRepository;
use crate::json_file::{retain_newest, JsonFile};
use qlens_common::error::QlensResult;

pub const DEPLOYMENTS_FILE: &str = "deployments.json";

pub struct FileDeploymentRepository {
    file: JsonFile<DeploymentEvent>,
}

impl FileDeploymentRepository {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            file: JsonFile::new(data_dir.join(DEPLOYMENTS_FILE)),
        }
    }
}

#[async_trait]
impl DeploymentRepository for FileDeploymentRepository {
    async fn insert_deployment(&self, deployment: DeploymentEvent) -> QlensResult<DeploymentEvent> {
        let saved = deployment.clone();
        self.file.update(move |items| items.push(deployment)).await?;
        Ok(saved)
    }

    async fn list_deployments(&self, filter: DeploymentFilter) -> QlensResult<Vec<DeploymentEvent>> {
        let mut items: Vec<_> = self
            .file
            .read()
            .await?
            .into_iter()
            .filter(|d| filter.matches(d))
            .collect();
        // stable sort on the reversed list keeps later inserts first on ties
        items.reverse();
        items.sort_by(|a, b| b.deployment_timestamp.cmp(&a.deployment_timestamp));
        Ok(items)
    }

    async fn trim(&self, project_key: &str, keep: usize) -> QlensResult<u64> {
        let removed = self
            .file
            .update(|items| {
                retain_newest(
                    items,
                    keep,
                    |d| d.project_key == project_key,
                    |d| d.deployment_timestamp,
                )
            })
            .await?;
        Ok(removed as u64)
    }
}
