use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_API_KEY_HEADER, DEFAULT_HTTP_TIMEOUT_MS, DEFAULT_LIMIT_PERIOD_SECONDS, DEFAULT_LIMIT_TOKEN,
    DEFAULT_METRICS_PATH, DEFAULT_PROXY_TOKEN_TTL_SECONDS, DEFAULT_SWEEP_INTERVAL_SECONDS,
};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub proxy_token: ProxyTokenConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub limit: Option<LimitConfig>,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            path: default_metrics_path(),
            is_enabled: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
}

/// Requests allowed per remote address within one window.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LimitConfig {
    #[serde(default = "default_limit_token")]
    pub token: u32,
    #[serde(default = "default_limit_period")]
    pub period_seconds: u64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            token: DEFAULT_LIMIT_TOKEN,
            period_seconds: DEFAULT_LIMIT_PERIOD_SECONDS,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    #[serde(default = "default_true")]
    pub is_enabled: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { is_enabled: true }
    }
}

/// ================================
/// Upstream address API
/// ================================
#[derive(Deserialize, Clone)]
pub struct UpstreamConfig {
    pub endpoint: String,
    pub client_id: String,
    pub secret_key: String,
    /// Sent as `X-Forwarded-For` when non-empty.
    #[serde(default)]
    pub forwarded_for: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .field("secret_key", &"<redacted>")
            .field("forwarded_for", &self.forwarded_for)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// ================================
/// Proxy tokens
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ProxyTokenConfig {
    #[serde(default = "default_header_name")]
    pub header_name: String,
    #[serde(default = "default_proxy_token_ttl")]
    pub ttl_seconds: u64,
    #[serde(default)]
    pub verification: Verification,
}

impl Default for ProxyTokenConfig {
    fn default() -> Self {
        Self {
            header_name: default_header_name(),
            ttl_seconds: DEFAULT_PROXY_TOKEN_TTL_SECONDS,
            verification: Verification::default(),
        }
    }
}

/// How an incoming proxy token is checked.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Verification {
    /// Issuer prefix only.
    #[default]
    Prefix,
    /// Issuer prefix and a live issuance record.
    Issued,
}

/// ================================
/// Issued-token cache
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default)]
    pub backend: CacheBackendKind,
    pub redis_url: Option<String>,
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::default(),
            redis_url: None,
            sweep_interval_seconds: DEFAULT_SWEEP_INTERVAL_SECONDS,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    #[default]
    Memory,
    Redis,
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new(level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new("info".to_owned(), LogFormat::Compact)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

fn default_metrics_path() -> String {
    DEFAULT_METRICS_PATH.to_owned()
}

fn default_limit_token() -> u32 {
    DEFAULT_LIMIT_TOKEN
}

fn default_limit_period() -> u64 {
    DEFAULT_LIMIT_PERIOD_SECONDS
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    DEFAULT_HTTP_TIMEOUT_MS
}

fn default_header_name() -> String {
    DEFAULT_API_KEY_HEADER.to_owned()
}

fn default_proxy_token_ttl() -> u64 {
    DEFAULT_PROXY_TOKEN_TTL_SECONDS
}

fn default_sweep_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECONDS
}
