use qlens_common::error::{QlensError, QlensResult};
use sqlx::PgPool;

const STATEMENTS: &[&str] = &[
    "create table if not exists sonarcloud_metrics (
        id bigserial primary key,
        project_key text not null,
        timestamp timestamptz not null,
        bugs bigint,
        reliability_rating text,
        reliability_remediation_effort bigint,
        vulnerabilities bigint,
        security_rating text,
        security_remediation_effort bigint,
        code_smells bigint,
        technical_debt bigint,
        debt_ratio double precision,
        maintainability_rating text,
        coverage_overall double precision,
        coverage_new double precision,
        duplication_density double precision,
        duplication_new_density double precision,
        lines_of_code bigint,
        complexity bigint,
        new_bugs bigint,
        new_vulnerabilities bigint,
        new_code_smells bigint,
        overall_rating text not null,
        technical_debt_minutes bigint,
        created_at timestamptz not null default now()
    )",
    "create index if not exists idx_sonarcloud_metrics_project_ts
        on sonarcloud_metrics (project_key, timestamp desc)",
    "create table if not exists dora_deployments (
        id uuid primary key,
        project_key text not null,
        commit_sha text not null,
        commit_timestamp timestamptz not null,
        deployment_timestamp timestamptz not null,
        environment text not null default 'production',
        status text not null default 'success' check (status in ('success', 'failure')),
        branch text not null default 'main',
        lead_time_minutes bigint not null,
        metadata jsonb,
        created_at timestamptz not null default now()
    )",
    "create index if not exists idx_dora_deployments_project_ts
        on dora_deployments (project_key, deployment_timestamp desc)",
    "create or replace function cleanup_old_sonarcloud_metrics(p_project_key text, p_keep_count integer)
     returns integer as $$
     declare
        deleted_count integer;
     begin
        delete from sonarcloud_metrics
        where id in (
            select id from sonarcloud_metrics
            where project_key = p_project_key
            order by timestamp desc, id desc
            offset p_keep_count
        );
        get diagnostics deleted_count = row_count;
        return deleted_count;
     end;
     $$ language plpgsql",
    "create or replace function cleanup_old_deployments(p_project_key text, p_keep_count integer)
     returns integer as $$
     declare
        deleted_count integer;
     begin
        delete from dora_deployments
        where id in (
            select id from dora_deployments
            where project_key = p_project_key
            order by deployment_timestamp desc, created_at desc
            offset p_keep_count
        );
        get diagnostics deleted_count = row_count;
        return deleted_count;
     end;
     $$ language plpgsql",
];

/// Create tables, indexes, and retention functions if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> QlensResult<()> {
    for statement in STATEMENTS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| QlensError::Database(format!("schema setup failed: {e}")))?;
    }
    tracing::info!("database schema ready");
    Ok(())
}
