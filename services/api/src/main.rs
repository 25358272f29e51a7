mod dora;
mod error;
mod extractors;
mod metrics;
mod projects;
mod sonarcloud;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use qlens_collector::{Collector, MeasuresSource, Scheduler};
use qlens_common::error::{QlensError, QlensResult};
use qlens_common::types::ServiceInfo;
use qlens_config::{init_tracing, AppConfig, ProjectRegistry, StorageBackend};
use qlens_db::storage::Storage;
use qlens_metrics::deployments::DeploymentRecorder;
use qlens_metrics::dora::DoraService;
use qlens_sonarcloud::{SonarCloudClient, SonarCloudClientConfig};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub storage: Storage,
    pub projects: Arc<ProjectRegistry>,
    pub sonarcloud: SonarCloudClient,
    pub collector: Arc<Collector>,
    pub dora: Arc<DoraService>,
    pub recorder: Arc<DeploymentRecorder>,
}

impl AppState {
    pub fn new(
        storage: Storage,
        projects: ProjectRegistry,
        sonarcloud: SonarCloudClient,
        metrics_retention: usize,
        deployments_retention: usize,
    ) -> Self {
        let source: Arc<dyn MeasuresSource> = Arc::new(sonarcloud.clone());
        let collector = Collector::new(source, storage.quality.clone(), projects.all().to_vec())
            .with_retention(metrics_retention);
        let recorder = DeploymentRecorder::new(storage.deployments.clone())
            .with_retention(deployments_retention);

        Self {
            dora: Arc::new(DoraService::new(storage.deployments.clone())),
            collector: Arc::new(collector),
            recorder: Arc::new(recorder),
            projects: Arc::new(projects),
            sonarcloud,
            storage,
        }
    }
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = if state.storage.is_healthy().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now(),
        "service": "Quality Lens API",
        "database": database,
        "storage": state.storage.backend_name(),
    }))
}

async fn info() -> Json<ServiceInfo> {
    Json(ServiceInfo::new("qlens-api"))
}

fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:5000"),
            HeaderValue::from_static("http://127.0.0.1:5000"),
        ])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/api/health", get(health))
        .route("/info", get(info))
        .merge(metrics::router())
        .merge(dora::router())
        .merge(projects::router())
        .merge(sonarcloud::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn open_storage(config: &AppConfig) -> QlensResult<Storage> {
    match (config.storage_backend, config.database_url.as_deref()) {
        (StorageBackend::Postgres, Some(url)) => Storage::connect_postgres(url).await,
        (StorageBackend::Postgres, None) => Err(QlensError::Config(
            "DATABASE_URL is required when STORAGE_BACKEND=postgres".to_string(),
        )),
        (StorageBackend::File, _) => Storage::open_file(&config.data_dir).await,
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

async fn run(config: AppConfig) -> QlensResult<()> {
    tracing::info!(service = "qlens-api", backend = ?config.storage_backend, "starting");

    let storage = open_storage(&config).await?;

    let sonarcloud = SonarCloudClient::new(SonarCloudClientConfig {
        base_url: config.sonarcloud_base_url.clone(),
        token: config.sonarcloud_token.clone(),
        max_retries: config.sonarcloud_max_retries,
        timeout_secs: config.sonarcloud_timeout_secs,
    })
    .map_err(|e| QlensError::Config(format!("cannot build sonarcloud client: {e}")))?;

    let state = AppState::new(
        storage,
        config.projects.clone(),
        sonarcloud,
        config.metrics_retention,
        config.deployments_retention,
    );

    // First cycle completes before the listener opens.
    let scheduler = Scheduler::new(
        state.collector.clone(),
        Duration::from_secs(config.collect_interval_secs),
    )
    .start()
    .await;

    let app = build_router(state);
    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .map_err(|e| QlensError::Config(format!("invalid bind address: {e}")))?;

    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| QlensError::Internal(format!("failed to bind {addr}: {e}")))?;
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| QlensError::Internal(format!("server error: {e}")));

    scheduler.stop().await;
    served
}

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_tracing("info");
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_level);

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "qlens-api failed");
        std::process::exit(1);
    }
}
