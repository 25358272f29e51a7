use std::future::Future;
use std::time::Duration;

use qlens_common::error::{QlensError, QlensResult};

/// Exponential backoff for database statements: the delay before retry `n`
/// (1-based) is `base_delay * 2^(n-1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_before(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(1u32 << retry.saturating_sub(1).min(16))
    }
}

/// Errors worth another attempt: I/O, pool exhaustion, and the connection,
/// serialization, and shutdown SQLSTATE classes.
pub fn is_transient(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db.code().is_some_and(|code| {
            code.starts_with("08")
                || code.starts_with("57P")
                || code == "40001"
                || code == "40P01"
                || code == "53300"
        }),
        _ => false,
    }
}

/// Run `op` until it succeeds, hits a non-transient error, or exhausts the
/// policy. The last error is returned as `QlensError::Database`.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> QlensResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts && is_transient(&e) => {
                let backoff = policy.delay_before(attempt);
                tracing::warn!(
                    op = label,
                    attempt,
                    max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %e,
                    "database call failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(QlensError::Database(format!("{label}: {e}")));
            }
        }
    }
}
