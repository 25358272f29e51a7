use async_trait::async_trait;

use crate::dora::models::{DeploymentEvent, DeploymentFilter};
use qlens_common::error::QlensResult;

#[async_trait]
pub trait DeploymentRepository: Send + Sync {
    async fn insert_deployment(&self, deployment: DeploymentEvent) -> QlensResult<DeploymentEvent>;

    /// Deployments matching the filter, newest deployment first.
    async fn list_deployments(&self, filter: DeploymentFilter) -> QlensResult<Vec<DeploymentEvent>>;

    /// Delete all but the newest `keep` deployments for the project, ordered
    /// by deployment timestamp. Returns the number of rows removed.
    async fn trim(&self, project_key: &str, keep: usize) -> QlensResult<u64>;
}
