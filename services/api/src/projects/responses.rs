use qlens_config::ProjectConfig;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub sonar_key: String,
}

impl From<&ProjectConfig> for ProjectSummary {
    fn from(project: &ProjectConfig) -> Self {
        Self {
            id: project.id.clone(),
            name: project.display_name(),
            sonar_key: project.sonar_key.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectSummary>,
    pub default: String,
}
