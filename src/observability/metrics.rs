use std::sync::Arc;

use anyhow::Result;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tokio::sync::OnceCell;
use tracing::info;

static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Process-wide metrics, registered on first use.
pub async fn get_metrics() -> Result<&'static Arc<Metrics>> {
    METRICS_INSTANCE
        .get_or_try_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new().map(Arc::new)
        })
        .await
}

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Proxy tokens
    pub proxy_tokens_issued: IntCounter,
    pub auth_rejections: IntCounterVec,
    pub rate_limited: IntCounter,

    // Upstream calls
    pub upstream_requests: IntCounterVec,
    pub upstream_duration: HistogramVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Result<Self> {
        let registry = Registry::new_custom(Some("latte".into()), None)?;

        let metrics = Self {
            proxy_tokens_issued: IntCounter::new("proxy_tokens_issued_total", "Proxy tokens issued")?,
            auth_rejections: IntCounterVec::new(
                Opts::new("auth_rejections_total", "Rejected requests by reason"),
                &["reason"],
            )?,
            rate_limited: IntCounter::new("rate_limited_total", "Requests refused by the rate limiter")?,

            upstream_requests: IntCounterVec::new(
                Opts::new("upstream_requests_total", "Upstream calls by endpoint and outcome"),
                &["endpoint", "outcome"],
            )?,
            upstream_duration: HistogramVec::new(
                HistogramOpts::new("upstream_duration_seconds", "Upstream call duration seconds")
                    .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),
                &["endpoint"],
            )?,

            config_validation_errors: IntCounter::new(
                "config_validation_errors_total",
                "Validation errors during startup",
            )?,
            up: IntGauge::new("up", "1 if service is healthy")?,

            registry,
        };

        let reg = &metrics.registry;
        reg.register(Box::new(metrics.proxy_tokens_issued.clone()))?;
        reg.register(Box::new(metrics.auth_rejections.clone()))?;
        reg.register(Box::new(metrics.rate_limited.clone()))?;
        reg.register(Box::new(metrics.upstream_requests.clone()))?;
        reg.register(Box::new(metrics.upstream_duration.clone()))?;
        reg.register(Box::new(metrics.config_validation_errors.clone()))?;
        reg.register(Box::new(metrics.up.clone()))?;

        Ok(metrics)
    }

    /// Records one upstream call.
    pub fn observe_upstream(&self, endpoint: &str, ok: bool, elapsed_secs: f64) {
        let outcome = if ok { "ok" } else { "error" };
        self.upstream_requests.with_label_values(&[endpoint, outcome]).inc();
        self.upstream_duration.with_label_values(&[endpoint]).observe(elapsed_secs);
    }
}
