use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::PgPool;

use crate::dora::file_repository::FileDeploymentRepository;
use crate::dora::pg_repository::PgDeploymentRepository;
use crate::dora::repositories::DeploymentRepository;
use crate::quality::file_repository::FileQualityMetricsRepository;
use crate::quality::pg_repository::PgQualityMetricsRepository;
use crate::quality::repositories::QualityMetricsRepository;
use crate::schema::ensure_schema;
use qlens_common::error::{QlensError, QlensResult};

enum Backing {
    Postgres(PgPool),
    File(PathBuf),
}

/// Both repositories behind one handle, with the backend chosen at startup.
#[derive(Clone)]
pub struct Storage {
    pub quality: Arc<dyn QualityMetricsRepository>,
    pub deployments: Arc<dyn DeploymentRepository>,
    backing: Arc<Backing>,
}

impl Storage {
    pub async fn connect_postgres(database_url: &str) -> QlensResult<Self> {
        let pool = crate::create_pool(database_url).await?;
        ensure_schema(&pool).await?;
        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            quality: Arc::new(PgQualityMetricsRepository::new(pool.clone())),
            deployments: Arc::new(PgDeploymentRepository::new(pool.clone())),
            backing: Arc::new(Backing::Postgres(pool)),
        }
    }

    pub async fn open_file(data_dir: &Path) -> QlensResult<Self> {
        tokio::fs::create_dir_all(data_dir).await.map_err(|e| {
            QlensError::Database(format!("cannot create {}: {e}", data_dir.display()))
        })?;
        tracing::info!(dir = %data_dir.display(), "using file storage");
        Ok(Self {
            quality: Arc::new(FileQualityMetricsRepository::new(data_dir)),
            deployments: Arc::new(FileDeploymentRepository::new(data_dir)),
            backing: Arc::new(Backing::File(data_dir.to_path_buf())),
        })
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backing.as_ref() {
            Backing::Postgres(_) => "postgres",
            Backing::File(_) => "file",
        }
    }

    /// Whether the store is reachable right now.
    pub async fn is_healthy(&self) -> bool {
        match self.backing.as_ref() {
            Backing::Postgres(pool) => sqlx::query("select 1").execute(pool).await.is_ok(),
            Backing::File(dir) => tokio::fs::metadata(dir)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false),
        }
    }
}
