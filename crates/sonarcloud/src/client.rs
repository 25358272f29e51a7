use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use qlens_common::error::QlensError;

use crate::models::{ComponentMeasuresResponse, ComponentTreeResponse, HotspotsResponse, IssuesResponse};

/// Metrics requested for every snapshot.
pub const METRIC_KEYS: &[&str] = &[
    "bugs",
    "reliability_rating",
    "reliability_remediation_effort",
    "vulnerabilities",
    "security_rating",
    "security_remediation_effort",
    "code_smells",
    "sqale_index",
    "sqale_debt_ratio",
    "sqale_rating",
    "ncloc",
    "coverage",
    "duplicated_lines_density",
    "complexity",
    "new_bugs",
    "new_vulnerabilities",
    "new_code_smells",
    "new_coverage",
    "new_duplicated_lines_density",
];

const PAGE_SIZE: &str = "100";

#[derive(Debug, Clone)]
pub struct SonarCloudClientConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub max_retries: u32,
    pub timeout_secs: u64,
}

impl Default for SonarCloudClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://sonarcloud.io/api".to_string(),
            token: None,
            max_retries: 3,
            timeout_secs: 30,
        }
    }
}

#[derive(Clone)]
pub struct SonarCloudClient {
    client: Client,
    config: SonarCloudClientConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum SonarCloudClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("max retries exceeded after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl From<SonarCloudClientError> for QlensError {
    fn from(err: SonarCloudClientError) -> Self {
        QlensError::Upstream(format!("sonarcloud: {err}"))
    }
}

impl SonarCloudClient {
    pub fn new(config: SonarCloudClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// For testing: create a client pointing at a specific base URL (e.g., wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    pub async fn fetch_measures(
        &self,
        component: &str,
    ) -> Result<ComponentMeasuresResponse, SonarCloudClientError> {
        let metric_keys = METRIC_KEYS.join(",");
        self.request_with_retry(
            "measures/component",
            &[("component", component), ("metricKeys", metric_keys.as_str())],
        )
        .await
    }

    /// Unresolved bugs, vulnerabilities, and smells in the new-code period.
    pub async fn search_issues(
        &self,
        project_key: &str,
    ) -> Result<IssuesResponse, SonarCloudClientError> {
        self.request_with_retry(
            "issues/search",
            &[
                ("componentKeys", project_key),
                ("resolved", "false"),
                ("inNewCodePeriod", "true"),
                ("types", "BUG,VULNERABILITY,CODE_SMELL"),
                ("severities", "BLOCKER,CRITICAL,MAJOR,MINOR"),
                ("ps", PAGE_SIZE),
            ],
        )
        .await
    }

    /// Per-file measures for the leaves of the component tree.
    pub async fn component_tree(
        &self,
        project_key: &str,
        metric_keys: &[&str],
    ) -> Result<ComponentTreeResponse, SonarCloudClientError> {
        let metric_keys = metric_keys.join(",");
        self.request_with_retry(
            "measures/component_tree",
            &[
                ("component", project_key),
                ("metricKeys", metric_keys.as_str()),
                ("strategy", "leaves"),
                ("ps", PAGE_SIZE),
            ],
        )
        .await
    }

    pub async fn search_hotspots(
        &self,
        project_key: &str,
    ) -> Result<HotspotsResponse, SonarCloudClientError> {
        self.request_with_retry(
            "hotspots/search",
            &[
                ("projectKey", project_key),
                ("inNewCodePeriod", "true"),
                ("ps", PAGE_SIZE),
                ("status", "TO_REVIEW"),
            ],
        )
        .await
    }

    async fn request_with_retry<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SonarCloudClientError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut last_error = String::new();
        let mut pause = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let wait = pause.take().unwrap_or_else(|| backoff_delay(attempt));
                tracing::warn!(
                    endpoint,
                    attempt,
                    backoff_ms = wait.as_millis() as u64,
                    "retrying sonarcloud request"
                );
                tokio::time::sleep(wait).await;
            }

            match self.attempt::<T>(&url, query).await? {
                Attempt::Done(value) => return Ok(value),
                Attempt::Retry { reason, wait } => {
                    last_error = reason;
                    pause = wait;
                }
            }
        }

        Err(SonarCloudClientError::MaxRetriesExceeded {
            attempts: self.config.max_retries + 1,
            last_error,
        })
    }

    /// One request. Transient failures come back as `Attempt::Retry`;
    /// everything else is final.
    async fn attempt<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Attempt<T>, SonarCloudClientError> {
        let mut request = self.client.get(url).query(query);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = match request.send().await {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() || e.is_connect() => {
                return Ok(Attempt::Retry { reason: e.to_string(), wait: None });
            }
            Err(e) => return Err(SonarCloudClientError::RequestError(e)),
        };

        let status = response.status();
        if status.is_success() {
            return Ok(Attempt::Done(response.json::<T>().await?));
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(Attempt::Retry {
                reason: "429 Too Many Requests".to_string(),
                wait: retry_after(response.headers()),
            });
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            return Ok(Attempt::Retry { reason: format!("{status}: {body}"), wait: None });
        }
        Err(SonarCloudClientError::HttpError { status, body })
    }
}

enum Attempt<T> {
    Done(T),
    Retry { reason: String, wait: Option<Duration> },
}

/// Exponential backoff: 2 s, 4 s, 8 s … capped at 30 s.
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1u64.checked_shl(attempt).unwrap_or(u64::MAX).min(30))
}

/// `Retry-After` in whole seconds, capped at 60.
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs.min(60)))
}
