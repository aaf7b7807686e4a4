use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::Router;
use http::header::{
    ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, CONTENT_ENCODING, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT,
};
use http::{HeaderName, Method};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::cache::{CacheBackend, MemoryCacheBackend};
use crate::client::{ConnectionInfo, Latte};
use crate::config::settings::{
    CacheBackendKind, CacheConfig, LimitConfig, ProxyTokenConfig, ServiceConfig, SettingsConfig, UpstreamConfig,
    Verification,
};
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::auth::{require_header, HeaderAuthProvider, HeaderValidator};
use crate::server::error::internal_error;
use crate::server::rate_limit::{limit_requests, RateLimiter};
use crate::server::routes;
use crate::token::{IssuedTokenValidator, PrefixValidator, TokenGenerator};

#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<Metrics>,
    pub metrics_state: MetricsState,
    pub latte: Arc<Latte>,
    pub generator: TokenGenerator,
    pub issued: Arc<dyn CacheBackend>,
    pub proxy_token_ttl_seconds: u64,
    pub auth: HeaderAuthProvider,
    pub limiter: RateLimiter,
}

impl AppState {
    pub fn new(
        metrics: Arc<Metrics>,
        latte: Latte,
        issued: Arc<dyn CacheBackend>,
        proxy_token: &ProxyTokenConfig,
        limit: &LimitConfig,
    ) -> Result<Self> {
        let generator = TokenGenerator::new();
        let validator: Arc<dyn HeaderValidator> = match proxy_token.verification {
            Verification::Prefix => Arc::new(PrefixValidator::new(generator)),
            Verification::Issued => Arc::new(IssuedTokenValidator::new(generator, issued.clone())),
        };
        let header_name = HeaderName::from_bytes(proxy_token.header_name.as_bytes())
            .with_context(|| format!("invalid auth header name '{}'", proxy_token.header_name))?;

        Ok(Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            metrics,
            latte: Arc::new(latte),
            generator,
            issued,
            proxy_token_ttl_seconds: proxy_token.ttl_seconds,
            auth: HeaderAuthProvider::new(header_name, validator),
            limiter: RateLimiter::new(limit),
        })
    }
}

/// Direct-mode client holding the upstream secret.
pub fn upstream_client(upstream: &UpstreamConfig) -> Result<Latte> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(upstream.timeout_ms))
        .build()
        .context("failed to build upstream HTTP client")?;
    let connection = ConnectionInfo::direct(
        upstream.endpoint.as_str(),
        upstream.client_id.as_str(),
        upstream.secret_key.as_str(),
        upstream.forwarded_for.as_str(),
    );
    Ok(Latte::with_http_client(connection, http))
}

/// Issued-token store. The in-memory backend is also returned on its own so
/// the caller can sweep it.
pub async fn build_cache(cache: &CacheConfig) -> Result<(Arc<dyn CacheBackend>, Option<MemoryCacheBackend>)> {
    match cache.backend {
        CacheBackendKind::Memory => {
            let memory = MemoryCacheBackend::new();
            Ok((Arc::new(memory.clone()), Some(memory)))
        }
        CacheBackendKind::Redis => redis_cache(cache).await,
    }
}

#[cfg(feature = "redis")]
async fn redis_cache(cache: &CacheConfig) -> Result<(Arc<dyn CacheBackend>, Option<MemoryCacheBackend>)> {
    let url = cache.redis_url.as_deref().context("cache.redis_url is required")?;
    let backend = crate::cache::RedisCacheBackend::connect(url).await?;
    info!("using redis cache backend");
    Ok((Arc::new(backend), None))
}

#[cfg(not(feature = "redis"))]
async fn redis_cache(_cache: &CacheConfig) -> Result<(Arc<dyn CacheBackend>, Option<MemoryCacheBackend>)> {
    anyhow::bail!("cache.backend 'redis' requires the 'redis' feature")
}

fn cors_layer(auth_header: HeaderName) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods([Method::OPTIONS, Method::GET, Method::POST])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            ACCEPT,
            USER_AGENT,
            ACCEPT_ENCODING,
            CONTENT_ENCODING,
            CONTENT_LENGTH,
            auth_header,
        ])
}

fn panic_response(_panic: Box<dyn Any + Send + 'static>) -> Response {
    error!("handler panicked");
    internal_error()
}

/// Proxy routes with auth, rate limiting, CORS and panic recovery.
pub fn router(state: AppState, settings: &SettingsConfig) -> Router {
    let protected = routes::address::router().route_layer(from_fn_with_state(state.auth.clone(), require_header));

    let api = Router::new()
        .merge(routes::token::router())
        .merge(protected)
        .layer(from_fn_with_state(state.limiter.clone(), limit_requests));

    let mut app = Router::new()
        .merge(api)
        .merge(state.metrics_state.router(&settings.metrics))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http());

    if settings.cors.is_enabled {
        app = app.layer(cors_layer(state.auth.header_name().clone()));
    }

    app.with_state(state)
}

/// Periodically drops expired issued tokens and finished rate-limit windows.
pub fn spawn_sweeper(memory: Option<MemoryCacheBackend>, limiter: RateLimiter, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let windows = limiter.purge_stale();
            let tokens = match &memory {
                Some(memory) => memory.purge_expired().await,
                None => 0,
            };
            if windows > 0 || tokens > 0 {
                debug!(windows, tokens, "sweep finished");
            }
        }
    })
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve(listener: TcpListener, app: Router, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

/// Builds every component from `service_config` and runs the proxy.
pub async fn start(service_config: &ServiceConfig) -> Result<()> {
    let metrics = get_metrics().await?;
    let (issued, memory) = build_cache(&service_config.cache).await?;
    let latte = upstream_client(&service_config.upstream)?;
    let limit = service_config.settings.limit.clone().unwrap_or_default();

    let state = AppState::new(metrics.clone(), latte, issued, &service_config.proxy_token, &limit)?;
    let sweeper = spawn_sweeper(
        memory,
        state.limiter.clone(),
        Duration::from_secs(service_config.cache.sweep_interval_seconds),
    );
    let app = router(state, &service_config.settings);

    let server = &service_config.settings.server;
    let listener = TcpListener::bind(format!("{}:{}", server.host, server.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", server.host, server.port))?;
    info!(address = %listener.local_addr()?, upstream = %service_config.upstream.endpoint, "latte-proxy listening");

    metrics.up.set(1);
    let result = serve(listener, app, shutdown_signal()).await;
    metrics.up.set(0);
    sweeper.abort();
    result
}
