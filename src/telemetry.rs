use anyhow::Context;
use tracing_subscriber::EnvFilter;

fn build_filter(configured: &str) -> anyhow::Result<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => {
            EnvFilter::try_new(&directives).with_context(|| format!("invalid RUST_LOG filter '{}'", directives))
        }
        _ => EnvFilter::try_new(configured).with_context(|| format!("invalid log filter '{}'", configured)),
    }
}

/// Installs the global subscriber. A non-empty `RUST_LOG` wins over the configured filter.
pub fn init_tracing(configured: &str) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(configured)?)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing already initialised: {}", e))
}

#[cfg(feature = "metrics-exporter")]
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()?;

    tracing::info!(port = port, "Prometheus exporter listening on /metrics");
    metrics::gauge!("marketx_up").set(1.0);
    Ok(())
}

#[cfg(not(feature = "metrics-exporter"))]
pub fn init_metrics(_port: u16) -> anyhow::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_filter_parses() {
        if std::env::var(EnvFilter::DEFAULT_ENV).is_err() {
            assert!(build_filter("marketx_rs=debug,sqlx=warn").is_ok());
            assert!(build_filter("info").is_ok());
        }
    }

    #[test]
    fn test_bad_filter_rejected() {
        if std::env::var(EnvFilter::DEFAULT_ENV).is_err() {
            let err = build_filter("marketx_rs=notalevel").unwrap_err();
            assert!(err.to_string().contains("invalid log filter"), "{}", err);
        }
    }
}
