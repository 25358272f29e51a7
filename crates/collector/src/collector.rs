use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use qlens_common::error::QlensResult;
use qlens_config::ProjectConfig;
use qlens_db::quality::models::QualityMetricSnapshot;
use qlens_db::quality::repositories::QualityMetricsRepository;
use qlens_metrics::normalize::normalize_response;
use qlens_metrics::retention::{trim_snapshots, DEFAULT_METRICS_RETENTION};

use crate::source::MeasuresSource;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOutcome {
    pub project: String,
    pub sonar_key: String,
    pub collected: bool,
    pub error: Option<String>,
    pub trimmed: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub collected: usize,
    pub failed: usize,
    pub projects: Vec<ProjectOutcome>,
}

/// Runs one collection pass over every configured project.
pub struct Collector {
    source: Arc<dyn MeasuresSource>,
    repo: Arc<dyn QualityMetricsRepository>,
    projects: Vec<ProjectConfig>,
    retention: usize,
}

impl Collector {
    pub fn new(
        source: Arc<dyn MeasuresSource>,
        repo: Arc<dyn QualityMetricsRepository>,
        projects: Vec<ProjectConfig>,
    ) -> Self {
        Self {
            source,
            repo,
            projects,
            retention: DEFAULT_METRICS_RETENTION,
        }
    }

    pub fn with_retention(mut self, retention: usize) -> Self {
        self.retention = retention;
        self
    }

    async fn collect_project(&self, project: &ProjectConfig) -> QlensResult<QualityMetricSnapshot> {
        let response = self.source.fetch_measures(&project.sonar_key).await?;
        let snapshot = normalize_response(&project.sonar_key, &response, Utc::now());
        self.repo.insert_snapshot(snapshot).await
    }

    /// Fetch, normalize, store, and trim each project in turn. A failing
    /// project is recorded in the report and the rest still run.
    pub async fn run_cycle(&self) -> CycleReport {
        let started_at = Utc::now();
        let mut outcomes = Vec::with_capacity(self.projects.len());

        for project in &self.projects {
            let outcome = match self.collect_project(project).await {
                Ok(snapshot) => {
                    tracing::info!(
                        project = %project.id,
                        sonar_key = %project.sonar_key,
                        overall_rating = %snapshot.overall_rating,
                        "metrics collected"
                    );
                    let trimmed =
                        trim_snapshots(self.repo.as_ref(), &project.sonar_key, self.retention)
                            .await;
                    ProjectOutcome {
                        project: project.id.clone(),
                        sonar_key: project.sonar_key.clone(),
                        collected: true,
                        error: None,
                        trimmed,
                    }
                }
                Err(e) => {
                    tracing::error!(project = %project.id, error = %e, "metrics collection failed");
                    ProjectOutcome {
                        project: project.id.clone(),
                        sonar_key: project.sonar_key.clone(),
                        collected: false,
                        error: Some(e.to_string()),
                        trimmed: 0,
                    }
                }
            };
            outcomes.push(outcome);
        }

        let collected = outcomes.iter().filter(|o| o.collected).count();
        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            collected,
            failed: outcomes.len() - collected,
            projects: outcomes,
        };

        tracing::info!(
            collected = report.collected,
            failed = report.failed,
            "collection cycle finished"
        );
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use qlens_common::error::QlensError;
    use qlens_db::quality::file_repository::FileQualityMetricsRepository;
    use qlens_db::quality::models::Rating;
    use qlens_sonarcloud::models::{ComponentMeasuresResponse, MeasuredComponent, Measure};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves fixed measures; keys listed in `failing` return an upstream error.
    pub(crate) struct FakeSource {
        pub calls: AtomicUsize,
        pub failing: Vec<String>,
    }

    impl FakeSource {
        pub(crate) fn new(failing: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                failing: failing.iter().map(|s| s.to_string()).collect(),
            })
        }
    }

    #[async_trait]
    impl MeasuresSource for FakeSource {
        async fn fetch_measures(&self, sonar_key: &str) -> QlensResult<ComponentMeasuresResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.iter().any(|k| k == sonar_key) {
                return Err(QlensError::Upstream(format!("{sonar_key} unavailable")));
            }
            Ok(ComponentMeasuresResponse {
                component: MeasuredComponent {
                    key: sonar_key.to_string(),
                    name: None,
                    measures: vec![
                        Measure::new("bugs", "2"),
                        Measure::new("reliability_rating", "2.0"),
                    ],
                },
            })
        }
    }

    #[derive(Default)]
    pub(crate) struct MemoryRepo {
        pub items: Mutex<Vec<QualityMetricSnapshot>>,
    }

    #[async_trait]
    impl QualityMetricsRepository for MemoryRepo {
        async fn insert_snapshot(
            &self,
            snapshot: QualityMetricSnapshot,
        ) -> QlensResult<QualityMetricSnapshot> {
            self.items.lock().unwrap().push(snapshot.clone());
            Ok(snapshot)
        }

        async fn get_latest(&self, project_key: &str) -> QlensResult<Option<QualityMetricSnapshot>> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.project_key == project_key)
                .max_by_key(|s| s.timestamp)
                .cloned())
        }

        async fn list_since(
            &self,
            project_key: &str,
            since: DateTime<Utc>,
        ) -> QlensResult<Vec<QualityMetricSnapshot>> {
            Ok(self
                .items
                .lock()
                .unwrap()
                .iter()
                .filter(|s| s.project_key == project_key && s.timestamp >= since)
                .cloned()
                .collect())
        }

        async fn trim(&self, _project_key: &str, _keep: usize) -> QlensResult<u64> {
            Ok(0)
        }
    }

    pub(crate) fn projects() -> Vec<ProjectConfig> {
        vec![
            ProjectConfig::new("alpha", "org_alpha"),
            ProjectConfig::new("beta", "org_beta"),
        ]
    }

    #[tokio::test]
    async fn cycle_writes_one_snapshot_per_project() {
        let repo = Arc::new(MemoryRepo::default());
        let collector = Collector::new(FakeSource::new(&[]), repo.clone(), projects());

        let report = collector.run_cycle().await;

        assert_eq!(report.collected, 2);
        assert_eq!(report.failed, 0);
        let items = repo.items.lock().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].project_key, "org_alpha");
        assert_eq!(items[0].reliability.rating, Some(Rating::B));
        assert_eq!(items[0].overall_rating, Rating::B);
    }

    #[tokio::test]
    async fn failing_project_does_not_stop_the_cycle() {
        let repo = Arc::new(MemoryRepo::default());
        let source = FakeSource::new(&["org_alpha"]);
        let collector = Collector::new(source.clone(), repo.clone(), projects());

        let report = collector.run_cycle().await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(report.collected, 1);
        assert_eq!(report.failed, 1);
        assert!(!report.projects[0].collected);
        assert!(report.projects[0].error.as_deref().unwrap().contains("unavailable"));
        assert_eq!(repo.items.lock().unwrap()[0].project_key, "org_beta");
    }

    #[tokio::test]
    async fn cycle_trims_to_retention() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Arc::new(FileQualityMetricsRepository::new(dir.path()));
        let collector =
            Collector::new(FakeSource::new(&[]), repo.clone(), projects()).with_retention(1);

        collector.run_cycle().await;
        let report = collector.run_cycle().await;

        assert_eq!(report.projects[0].trimmed, 1);
        let since = Utc::now() - chrono::Duration::hours(1);
        assert_eq!(repo.list_since("org_alpha", since).await.unwrap().len(), 1);
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = CycleReport {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            collected: 1,
            failed: 0,
            projects: vec![ProjectOutcome {
                project: "alpha".to_string(),
                sonar_key: "org_alpha".to_string(),
                collected: true,
                error: None,
                trimmed: 0,
            }],
        };
        let json = serde_json::to_value(report).unwrap();
        assert_eq!(json["projects"][0]["sonarKey"], "org_alpha");
        assert!(json["startedAt"].is_string());
    }
}
