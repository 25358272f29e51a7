use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::quality::models::{
    Coverage, Duplication, Maintainability, NewCode, QualityMetricSnapshot, Rating, Reliability,
    Security, Size,
};
use crate::quality::repositories::QualityMetricsRepository;
use crate::retry::{with_retry, RetryPolicy};
use qlens_common::error::QlensResult;

const SNAPSHOT_COLUMNS: &str = "project_key, timestamp,
    bugs, reliability_rating, reliability_remediation_effort,
    vulnerabilities, security_rating, security_remediation_effort,
    code_smells, technical_debt, debt_ratio, maintainability_rating,
    coverage_overall, coverage_new,
    duplication_density, duplication_new_density,
    lines_of_code, complexity,
    new_bugs, new_vulnerabilities, new_code_smells,
    overall_rating, technical_debt_minutes";

#[derive(Clone)]
pub struct PgQualityMetricsRepository {
    pool: PgPool,
    retry: RetryPolicy,
}

impl PgQualityMetricsRepository {
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
impl QualityMetricsRepository for PgQualityMetricsRepository {
    async fn insert_snapshot(
        &self,
        snapshot: QualityMetricSnapshot,
    ) -> QlensResult<QualityMetricSnapshot> {
        let sql = format!(
            "insert into sonarcloud_metrics ({SNAPSHOT_COLUMNS})
             values ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12,
                     $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23)
             returning {SNAPSHOT_COLUMNS}"
        );
        let (sql, s, pool) = (sql.as_str(), &snapshot, &self.pool);

        let row = with_retry(self.retry, "insert snapshot", move || async move {
            sqlx::query(sql)
                .bind(&s.project_key)
                .bind(s.timestamp)
                .bind(s.reliability.bugs)
                .bind(s.reliability.rating.map(|r| r.as_str()))
                .bind(s.reliability.remediation_effort)
                .bind(s.security.vulnerabilities)
                .bind(s.security.rating.map(|r| r.as_str()))
                .bind(s.security.remediation_effort)
                .bind(s.maintainability.code_smells)
                .bind(s.maintainability.technical_debt)
                .bind(s.maintainability.debt_ratio)
                .bind(s.maintainability.rating.map(|r| r.as_str()))
                .bind(s.coverage.overall)
                .bind(s.coverage.new)
                .bind(s.duplication.density)
                .bind(s.duplication.new_density)
                .bind(s.size.lines_of_code)
                .bind(s.size.complexity)
                .bind(s.new_code.bugs)
                .bind(s.new_code.vulnerabilities)
                .bind(s.new_code.code_smells)
                .bind(s.overall_rating.as_str())
                .bind(s.technical_debt_minutes)
                .fetch_one(pool)
                .await
        })
        .await?;

        Ok(map_snapshot_row(&row))
    }

    async fn get_latest(&self, project_key: &str) -> QlensResult<Option<QualityMetricSnapshot>> {
        let sql = format!(
            "select {SNAPSHOT_COLUMNS}
             from sonarcloud_metrics
             where project_key = $1
             order by timestamp desc, id desc
             limit 1"
        );
        let (sql, pool) = (sql.as_str(), &self.pool);

        let row = with_retry(self.retry, "get latest snapshot", move || async move {
            sqlx::query(sql).bind(project_key).fetch_optional(pool).await
        })
        .await?;

        Ok(row.map(|r| map_snapshot_row(&r)))
    }

    async fn list_since(
        &self,
        project_key: &str,
        since: DateTime<Utc>,
    ) -> QlensResult<Vec<QualityMetricSnapshot>> {
        let sql = format!(
            "select {SNAPSHOT_COLUMNS}
             from sonarcloud_metrics
             where project_key = $1 and timestamp >= $2
             order by timestamp desc, id desc"
        );
        let (sql, pool) = (sql.as_str(), &self.pool);

        let rows = with_retry(self.retry, "list snapshots", move || async move {
            sqlx::query(sql)
                .bind(project_key)
                .bind(since)
                .fetch_all(pool)
                .await
        })
        .await?;

        Ok(rows.iter().map(map_snapshot_row).collect())
    }

    async fn trim(&self, project_key: &str, keep: usize) -> QlensResult<u64> {
        let keep = i32::try_from(keep).unwrap_or(i32::MAX);
        let pool = &self.pool;

        let deleted: i32 = with_retry(self.retry, "trim snapshots", move || async move {
            sqlx::query_scalar("select cleanup_old_sonarcloud_metrics($1, $2)")
                .bind(project_key)
                .bind(keep)
                .fetch_one(pool)
                .await
        })
        .await?;

        Ok(deleted.max(0) as u64)
    }
}

fn rating_column(row: &sqlx::postgres::PgRow, column: &str) -> Option<Rating> {
    row.get::<Option<String>, _>(column)
        .as_deref()
        .and_then(Rating::parse)
}

fn map_snapshot_row(row: &sqlx::postgres::PgRow) -> QualityMetricSnapshot {
    QualityMetricSnapshot {
        timestamp: row.get("timestamp"),
        project_key: row.get("project_key"),
        reliability: Reliability {
            bugs: row.get("bugs"),
            rating: rating_column(row, "reliability_rating"),
            remediation_effort: row.get("reliability_remediation_effort"),
        },
        security: Security {
            vulnerabilities: row.get("vulnerabilities"),
            rating: rating_column(row, "security_rating"),
            remediation_effort: row.get("security_remediation_effort"),
        },
        maintainability: Maintainability {
            code_smells: row.get("code_smells"),
            technical_debt: row.get("technical_debt"),
            debt_ratio: row.get("debt_ratio"),
            rating: rating_column(row, "maintainability_rating"),
        },
        coverage: Coverage {
            overall: row.get("coverage_overall"),
            new: row.get("coverage_new"),
        },
        duplication: Duplication {
            density: row.get("duplication_density"),
            new_density: row.get("duplication_new_density"),
        },
        size: Size {
            lines_of_code: row.get("lines_of_code"),
            complexity: row.get("complexity"),
        },
        new_code: NewCode {
            bugs: row.get("new_bugs"),
            vulnerabilities: row.get("new_vulnerabilities"),
            code_smells: row.get("new_code_smells"),
        },
        overall_rating: rating_column(row, "overall_rating").unwrap_or(Rating::A),
        technical_debt_minutes: row.get("technical_debt_minutes"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, schema::ensure_schema};
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    async fn test_repo() -> Option<PgQualityMetricsRepository> {
        let url = std::env::var("TEST_DATABASE_URL").ok()?;
        let pool = create_pool(&url).await.expect("db should connect");
        ensure_schema(&pool).await.expect("schema");
        Some(PgQualityMetricsRepository::new(pool))
    }

    fn make_snapshot(project_key: &str, minutes: i64) -> QualityMetricSnapshot {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        let mut s = QualityMetricSnapshot::empty(project_key, ts);
        s.reliability.bugs = Some(3);
        s.reliability.rating = Some(Rating::C);
        s.maintainability.debt_ratio = Some(1.25);
        s.coverage.overall = Some(81.4);
        s.overall_rating = Rating::C;
        s
    }

    #[tokio::test]
    async fn insert_and_get_latest() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let project = format!("test_{}", Uuid::new_v4());

        repo.insert_snapshot(make_snapshot(&project, 0)).await.expect("insert");
        let newer = repo
            .insert_snapshot(make_snapshot(&project, 10))
            .await
            .expect("insert");

        let latest = repo.get_latest(&project).await.expect("latest").unwrap();
        assert_eq!(latest.timestamp, newer.timestamp);
        assert_eq!(latest.reliability.rating, Some(Rating::C));
        assert_eq!(latest.security.rating, None);
        assert_eq!(latest.reliability.bugs, Some(3));
        assert_eq!(latest.size.lines_of_code, None);
    }

    #[tokio::test]
    async fn get_latest_none_for_unknown_project() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let latest = repo
            .get_latest(&format!("test_{}", Uuid::new_v4()))
            .await
            .expect("latest");
        assert!(latest.is_none());
    }

    #[tokio::test]
    async fn trim_keeps_newest() {
        let repo = match test_repo().await {
            Some(r) => r,
            None => return,
        };
        let project = format!("test_{}", Uuid::new_v4());
        for m in 0..5 {
            repo.insert_snapshot(make_snapshot(&project, m)).await.expect("insert");
        }

        let deleted = repo.trim(&project, 3).await.expect("trim");
        assert_eq!(deleted, 2);

        let since = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
        let rest = repo.list_since(&project, since).await.expect("list");
        assert_eq!(rest.len(), 3);
        assert!(rest.iter().all(|s| s.timestamp >= make_snapshot(&project, 2).timestamp));
    }
}
