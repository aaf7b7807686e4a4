// tests/common/mod.rs
use std::net::SocketAddr;

use axum::Router;
use reqwest::Client;
use tokio::task::JoinHandle;

use crate::config::proc_loader::parse_config;
use crate::config::settings::ServiceConfig;
use crate::observability::metrics::get_metrics;
use crate::server::server::{build_cache, router, serve, upstream_client, AppState};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Minimal valid proxy config pointing at `upstream`.
pub async fn proxy_config(upstream: &str) -> ServiceConfig {
    let yaml = format!(
        r#"
settings:
  server:
    host: 127.0.0.1
    port: "0"
  metrics:
    is_enabled: true
    path: /metrics
upstream:
  endpoint: {}
  client_id: test-client
  secret_key: test-secret
  timeout_ms: 2000
"#,
        upstream
    );
    parse_config(yaml).await.expect("test config must be valid")
}

/// Runs the full proxy router on an ephemeral port.
pub async fn spawn_proxy(config: &ServiceConfig) -> (JoinHandle<()>, SocketAddr) {
    let metrics = get_metrics().await.expect("metrics").clone();
    let (issued, _) = build_cache(&config.cache).await.expect("cache backend");
    let latte = upstream_client(&config.upstream).expect("upstream client");
    let limit = config.settings.limit.clone().unwrap_or_default();
    let state = AppState::new(metrics, latte, issued, &config.proxy_token, &limit).expect("app state");
    let app = router(state, &config.settings);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        serve(listener, app, std::future::pending()).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}
