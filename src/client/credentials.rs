use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::client::classifier::execute_catching;
use crate::error::LatteError;
use crate::helpers::time::{saturating_add, to_chrono, Clock, SystemClock};
use crate::models::{ProxyTokenRequest, ProxyTokenResponse};
use crate::utils::constants::{DEFAULT_API_KEY_HEADER, PROXY_TOKEN_PATH};

/// Remaining validity below which a cached proxy credential is replaced.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Supplies the header attached to every request sent through a proxy.
#[async_trait]
pub trait CredentialsProvider: Send + Sync {
    /// Returns `(header name, header value)` valid for `host`.
    async fn provide(&self, host: &str) -> Result<(String, String), LatteError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub host: String,
    pub value: String,
    /// As reported by the proxy; never extended locally.
    pub expires_at: DateTime<Utc>,
}

/// Obtains proxy tokens from `{host}/proxytoken` and caches the latest one.
///
/// The freshness check and the refresh share one critical section, so
/// concurrent callers on a cold cache produce a single network call.
#[derive(Debug)]
pub struct DefaultCredentialsProvider {
    http: Client,
    current: Mutex<Option<Credentials>>,
    clock: Arc<dyn Clock>,
    margin: chrono::Duration,
    header_name: String,
}

impl Default for DefaultCredentialsProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DefaultCredentialsProvider {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(http: Client) -> Self {
        Self {
            http,
            current: Mutex::new(None),
            clock: Arc::new(SystemClock),
            margin: to_chrono(DEFAULT_REFRESH_MARGIN),
            header_name: DEFAULT_API_KEY_HEADER.to_owned(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_margin(mut self, margin: Duration) -> Self {
        self.margin = to_chrono(margin);
        self
    }

    pub fn with_header_name(mut self, header_name: impl Into<String>) -> Self {
        self.header_name = header_name.into();
        self
    }

    /// Snapshot of the cached credential, if any.
    pub async fn current(&self) -> Option<Credentials> {
        self.current.lock().await.clone()
    }

    async fn fetch(&self, host: &str) -> Result<ProxyTokenResponse, LatteError> {
        let url = format!("{}{}", host.trim_end_matches('/'), PROXY_TOKEN_PATH);
        execute_catching(self.http.post(url).json(&ProxyTokenRequest::default())).await
    }
}

#[async_trait]
impl CredentialsProvider for DefaultCredentialsProvider {
    async fn provide(&self, host: &str) -> Result<(String, String), LatteError> {
        let mut current = self.current.lock().await;

        if let Some(credentials) = current.as_ref() {
            if credentials.host == host && saturating_add(self.clock.now(), self.margin) <= credentials.expires_at {
                return Ok((self.header_name.clone(), credentials.value.clone()));
            }
        }

        debug!(host = %host, "requesting proxy credentials");
        let response = self.fetch(host).await?;
        info!(host = %host, expires_at = %response.expires_at, "proxy credentials refreshed");

        let value = response.proxy_token.clone();
        *current = Some(Credentials {
            host: host.to_owned(),
            value: response.proxy_token,
            expires_at: response.expires_at,
        });
        Ok((self.header_name.clone(), value))
    }
}
