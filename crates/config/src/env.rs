use qlens_common::error::{QlensError, QlensResult};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::projects::{ProjectRegistry, DEFAULT_PROJECTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    File,
}

impl FromStr for StorageBackend {
    type Err = QlensError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "file" | "json" => Ok(Self::File),
            other => Err(QlensError::Config(format!(
                "invalid STORAGE_BACKEND {other:?}, expected postgres or file"
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub sonarcloud_base_url: String,
    pub sonarcloud_token: Option<String>,
    pub sonarcloud_max_retries: u32,
    pub sonarcloud_timeout_secs: u64,
    pub projects: ProjectRegistry,
    pub collect_interval_secs: u64,
    pub metrics_retention: usize,
    pub deployments_retention: usize,
}

impl AppConfig {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present, then reads the vars, applying defaults.
    pub fn from_env() -> QlensResult<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        let database_url = get_opt_var("DATABASE_URL");
        let storage_backend = match get_opt_var("STORAGE_BACKEND") {
            Some(raw) => raw.parse()?,
            None if database_url.is_some() => StorageBackend::Postgres,
            None => StorageBackend::File,
        };
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(QlensError::Config(
                "DATABASE_URL is required when STORAGE_BACKEND=postgres".to_string(),
            ));
        }

        let projects = ProjectRegistry::parse_csv(&get_var_or("SONARCLOUD_PROJECTS", DEFAULT_PROJECTS))?;
        let default_project = get_opt_var("DEFAULT_PROJECT").unwrap_or_else(|| projects[0].id.clone());
        let projects = ProjectRegistry::new(projects, &default_project)?;

        let collect_interval_secs: u64 = parse_var("COLLECT_INTERVAL_SECS", 600)?;
        if collect_interval_secs == 0 {
            return Err(QlensError::Config(
                "COLLECT_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            storage_backend,
            database_url,
            data_dir: PathBuf::from(get_var_or("DATA_DIR", "./data")),
            host: get_var_or("HOST", "0.0.0.0"),
            port: parse_var("PORT", 3001)?,
            log_level: get_var_or("LOG_LEVEL", "info"),
            sonarcloud_base_url: get_var_or("SONARCLOUD_BASE_URL", "https://sonarcloud.io/api"),
            sonarcloud_token: get_opt_var("SONARCLOUD_TOKEN"),
            sonarcloud_max_retries: parse_var("SONARCLOUD_MAX_RETRIES", 3)?,
            sonarcloud_timeout_secs: parse_var("SONARCLOUD_TIMEOUT_SECS", 30)?,
            projects,
            collect_interval_secs,
            metrics_retention: parse_var("METRICS_RETENTION", 1000)?,
            deployments_retention: parse_var("DEPLOYMENTS_RETENTION", 500)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn get_opt_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_var_or(key: &str, default: &str) -> String {
    get_opt_var(key).unwrap_or_else(|| default.to_owned())
}

fn parse_var<T>(key: &str, default: T) -> QlensResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_opt_var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| QlensError::Config(format!("invalid {key}: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "STORAGE_BACKEND",
        "DATABASE_URL",
        "DATA_DIR",
        "PORT",
        "SONARCLOUD_PROJECTS",
        "DEFAULT_PROJECT",
        "COLLECT_INTERVAL_SECS",
        "SONARCLOUD_TOKEN",
    ];

    fn clear_env() {
        for v in VARS {
            env::remove_var(v);
        }
    }

    #[test]
    fn defaults_to_file_backend_without_database_url() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear_env();

        let cfg = AppConfig::from_env().expect("should parse config");
        assert_eq!(cfg.storage_backend, StorageBackend::File);
        assert_eq!(cfg.port, 3001);
        assert_eq!(cfg.collect_interval_secs, 600);
        assert_eq!(cfg.metrics_retention, 1000);
        assert_eq!(cfg.deployments_retention, 500);
        assert_eq!(cfg.projects.all().len(), 2);
        assert_eq!(cfg.projects.default_id(), "fklearn");
        assert!(cfg.sonarcloud_token.is_none());
    }

    #[test]
    fn database_url_selects_postgres() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear_env();
        env::set_var("DATABASE_URL", "postgres://localhost/qlens_test");

        let cfg = AppConfig::from_env().expect("should parse config");
        assert_eq!(cfg.storage_backend, StorageBackend::Postgres);
        assert_eq!(
            cfg.database_url.as_deref(),
            Some("postgres://localhost/qlens_test")
        );

        clear_env();
    }

    #[test]
    fn postgres_without_database_url_fails() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear_env();
        env::set_var("STORAGE_BACKEND", "postgres");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn custom_projects_and_default() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear_env();
        env::set_var("SONARCLOUD_PROJECTS", "a=org_a,b=org_b");
        env::set_var("DEFAULT_PROJECT", "b");

        let cfg = AppConfig::from_env().expect("should parse config");
        assert_eq!(cfg.projects.default_id(), "b");
        assert_eq!(cfg.projects.resolve(None).unwrap().sonar_key, "org_b");

        clear_env();
    }

    #[test]
    fn invalid_port_fails() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear_env();
        env::set_var("PORT", "not-a-port");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn zero_interval_fails() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear_env();
        env::set_var("COLLECT_INTERVAL_SECS", "0");

        assert!(AppConfig::from_env().is_err());

        clear_env();
    }

    #[test]
    fn storage_backend_parses_aliases() {
        assert_eq!(
            "PostgreSQL".parse::<StorageBackend>().unwrap(),
            StorageBackend::Postgres
        );
        assert_eq!("json".parse::<StorageBackend>().unwrap(), StorageBackend::File);
        assert!("redis".parse::<StorageBackend>().is_err());
    }
}
