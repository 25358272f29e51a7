use async_trait::async_trait;

use qlens_common::error::QlensResult;
use qlens_sonarcloud::models::ComponentMeasuresResponse;
use qlens_sonarcloud::SonarCloudClient;

/// Where a collection cycle gets its raw measures from.
#[async_trait]
pub trait MeasuresSource: Send + Sync {
    async fn fetch_measures(&self, sonar_key: &str) -> QlensResult<ComponentMeasuresResponse>;
}

#[async_trait]
impl MeasuresSource for SonarCloudClient {
    async fn fetch_measures(&self, sonar_key: &str) -> QlensResult<ComponentMeasuresResponse> {
        Ok(SonarCloudClient::fetch_measures(self, sonar_key).await?)
    }
}
