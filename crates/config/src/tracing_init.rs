use tracing_subscriber::{fmt, EnvFilter};

/// `RUST_LOG` directives win over the configured `LOG_LEVEL`; anything
/// unparseable falls through to `info`.
fn filter_for(rust_log: Option<&str>, log_level: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(log_level).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Install the global fmt subscriber. Later calls are ignored.
pub fn init_tracing(log_level: &str) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = filter_for(
        rust_log.as_deref().filter(|v| !v.trim().is_empty()),
        log_level,
    );

    if fmt().with_env_filter(filter).with_target(true).try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_level_applies_without_rust_log() {
        assert_eq!(filter_for(None, "debug").to_string(), "debug");
    }

    #[test]
    fn rust_log_overrides_configured_level() {
        let filter = filter_for(Some("qlens_api=trace"), "warn");
        assert_eq!(filter.to_string(), "qlens_api=trace");
    }
}
