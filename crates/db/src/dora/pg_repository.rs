use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::dora::models::{DeploymentEvent, DeploymentFilter, DeploymentStatus};
use crate::dora::repositories::DeploymentRepository;
use crate::retry::{with_retry, RetryPolicy};
use qlens_common::error::{QlensError, QlensResult};

#[derive(Clone)]
pub struct PgDeploymentRepository {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgDeploymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl DeploymentRepository for PgDeploymentRepository {
    async fn insert_deployment(&self, deployment: DeploymentEvent) -> QlensResult<DeploymentEvent> {
        let (d, pool) = (&deployment, &self.pool);

        let row = with_retry(self.retry, "insert deployment", move || async move {
            sqlx::query(
                "insert into dora_deployments (
                    id, project_key, commit_sha, commit_timestamp, deployment_timestamp,
                    environment, status, branch, lead_time_minutes, metadata, created_at
                 ) values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                 returning *",
            )
            .bind(d.id)
            .bind(&d.project_key)
            .bind(&d.commit_sha)
            .bind(d.commit_timestamp)
            .bind(d.deployment_timestamp)
            .bind(&d.environment)
            .bind(d.status.as_str())
            .bind(&d.branch)
            .bind(d.lead_time_minutes)
            .bind(&d.metadata)
            .bind(d.created_at)
            .fetch_one(pool)
            .await
        })
        .await?;

        map_deployment_row(&row)
    }

    async fn list_deployments(&self, filter: DeploymentFilter) -> QlensResult<Vec<DeploymentEvent>> {
        let (f, pool) = (&filter, &self.pool);

        let rows = with_retry(self.retry, "list deployments", move || async move {
            sqlx::query(
                "select * from dora_deployments
                 where project_key = $1
                   and ($2::timestamptz is null or deployment_timestamp >= $2)
                   and ($3::timestamptz is null or deployment_timestamp <= $3)
                 order by deployment_timestamp desc, created_at desc",
            )
            .bind(&f.project_key)
            .bind(f.since)
            .bind(f.until)
            .fetch_all(pool)
            .await
        })
        .await?;

        rows.iter().map(map_deployment_row).collect()
    }

    async fn trim(&self, project_key: &str, keep: usize) -> QlensResult<u64> {
        let keep = i32::try_from(keep).unwrap_or(i32::MAX);
        let pool = &self.pool;

        let deleted: i32 = with_retry(self.retry, "trim deployments", move || async move {
            sqlx::query_scalar("select cleanup_old_deployments($1, $2)")
                .bind(project_key)
                .bind(keep)
                .fetch_one(pool)
                .await
        })
        .await?;

        Ok(deleted.max(0) as u64)
    }
}

fn map_deployment_row(row: &sqlx::postgres::PgRow) -> QlensResult<DeploymentEvent> {
    let status_raw: String = row.get("status");
    let status = DeploymentStatus::from_str(&status_raw)
        .map_err(|e| QlensError::Internal(format!("stored deployment: {e}")))?;

    Ok(DeploymentEvent {
        id: row.get("id"),
        project_key: row.get("project_key"),
        commit_sha: row.get("commit_sha"),
        commit_timestamp: row.get("commit_timestamp"),
        deployment_timestamp: row.get("deployment_timestamp"),
        environment: row.get("environment"),
        status,
        branch: row.get("branch"),
        lead_time_minutes: row.get("lead_time_minutes"),
        metadata: row.get("metadata"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, schema::ensure_schema};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    async fn test_repo() -> Option<PgDeploymentRepository> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = create_pool(&url).await.expect("db should connect");
        ensure_schema(&pool).await.expect("schema");
        Some(PgDeploymentRepository::new(pool))
    }

    fn at(hours: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::hours(hours)
    }

    fn make_deployment(project_key: &str, hours: i64, status: DeploymentStatus) -> DeploymentEvent {
        DeploymentEvent {
            id: Uuid::new_v4(),
            project_key: project_key.to_string(),
            commit_sha: format!("sha{hours}"),
            commit_timestamp: at(hours) - Duration::minutes(90),
            deployment_timestamp: at(hours),
            environment: "production".to_string(),
            status,
            branch: "main".to_string(),
            lead_time_minutes: 90,
            metadata: Some(serde_json::json!({ "pipeline": hours })),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn insert_and_list_in_window() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let project = format!("test_{}", Uuid::new_v4());

        for h in [0, 5, 10] {
            repo.insert_deployment(make_deployment(&project, h, DeploymentStatus::Success))
                .await
                .expect("insert");
        }
        repo.insert_deployment(make_deployment(&project, 7, DeploymentStatus::Failure))
            .await
            .expect("insert");

        let filter = DeploymentFilter {
            project_key: project.clone(),
            since: Some(at(5)),
            until: Some(at(10)),
        };
        let items = repo.list_deployments(filter).await.expect("list");
        let hours: Vec<_> = items.iter().map(|d| d.commit_sha.clone()).collect();
        assert_eq!(hours, vec!["sha10", "sha7", "sha5"]);
        assert_eq!(items[1].status, DeploymentStatus::Failure);
        assert_eq!(items[0].metadata, Some(serde_json::json!({ "pipeline": 10 })));
    }

    #[tokio::test]
    async fn trim_keeps_newest_deployments() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let project = format!("test_{}", Uuid::new_v4());
        for h in 0..4 {
            repo.insert_deployment(make_deployment(&project, h, DeploymentStatus::Success))
                .await
                .expect("insert");
        }

        assert_eq!(repo.trim(&project, 2).await.expect("trim"), 2);
        let rest = repo
            .list_deployments(DeploymentFilter::for_project(&project))
            .await
            .expect("list");
        assert_eq!(rest.len(), 2);
        assert_eq!(rest[0].commit_sha, "sha3");
        assert_eq!(rest[1].commit_sha, "sha2");
    }
}
