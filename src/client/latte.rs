use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use http::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::client::classifier::execute_catching;
use crate::client::connection::ConnectionInfo;
use crate::client::token_cache::{TokenCache, DEFAULT_TOKEN_VALIDITY};
use crate::error::LatteError;
use crate::helpers::time::{Clock, SystemClock};
use crate::models::{
    AddressZipRequest, AddressZipResponse, SearchCodeRequest, SearchCodeResponse, TokenRequest, TokenResponse,
};

const FORWARDED_FOR: &str = "X-Forwarded-For";

/// Client for the digital address API, either direct or through a proxy.
#[derive(Debug)]
pub struct Latte {
    connection: ConnectionInfo,
    http: Client,
    tokens: TokenCache,
}

impl Latte {
    /// Client that goes through a latte proxy without credentials.
    pub fn proxy(url: impl Into<String>) -> Self {
        Self::new(ConnectionInfo::proxy(url))
    }

    pub fn direct(
        url: impl Into<String>,
        client_id: impl Into<String>,
        secret_key: impl Into<String>,
        forwarded_for: impl Into<String>,
    ) -> Self {
        Self::new(ConnectionInfo::direct(url, client_id, secret_key, forwarded_for))
    }

    pub fn new(connection: ConnectionInfo) -> Self {
        Self::with_http_client(connection, Client::new())
    }

    pub fn with_http_client(connection: ConnectionInfo, http: Client) -> Self {
        Self {
            connection,
            http,
            tokens: TokenCache::new(DEFAULT_TOKEN_VALIDITY, Arc::new(SystemClock)),
        }
    }

    /// Replaces the bearer-token cache with one using `validity` and `clock`.
    pub fn with_token_cache(mut self, validity: Duration, clock: Arc<dyn Clock>) -> Self {
        self.tokens = TokenCache::new(validity, clock);
        self
    }

    pub fn connection_info(&self) -> &ConnectionInfo {
        &self.connection
    }

    pub fn token_cache(&self) -> &TokenCache {
        &self.tokens
    }

    /// Requests a new bearer token and caches it.
    pub async fn token(&self) -> Result<TokenResponse, LatteError> {
        self.tokens.refresh(|| self.request_token()).await
    }

    /// Cached bearer token, refreshed when it has aged out.
    pub async fn get_token(&self) -> Result<String, LatteError> {
        self.tokens.get_token(|| self.request_token()).await
    }

    /// Runs `block` with a valid bearer token.
    pub async fn with_token<R, F, Fut>(&self, block: F) -> Result<R, LatteError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<R, LatteError>>,
    {
        let token = self.get_token().await?;
        block(token).await
    }

    /// Looks up zip codes matching address fields.
    pub async fn address_zip(&self, token: &str, request: &AddressZipRequest) -> Result<AddressZipResponse, LatteError> {
        let builder = self
            .http
            .post(self.connection.address_zip_url())
            .header(AUTHORIZATION, bearer(token))
            .json(request);
        execute_catching(self.decorate(builder).await?).await
    }

    /// Looks up addresses by zip code, digital address or business code.
    pub async fn search(&self, token: &str, code: &str, params: &SearchCodeRequest) -> Result<SearchCodeResponse, LatteError> {
        let url = self.connection.search_code_url(code)?;
        let builder = self
            .http
            .get(url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, bearer(token))
            .query(params);
        execute_catching(self.decorate(builder).await?).await
    }

    async fn request_token(&self) -> Result<TokenResponse, LatteError> {
        let builder = self.http.post(self.connection.token_url());
        let builder = match &self.connection {
            ConnectionInfo::Direct {
                client_id,
                secret_key,
                ..
            } => builder.json(&TokenRequest::new(client_id.as_str(), secret_key.as_str())),
            ConnectionInfo::Proxy { .. } => builder.header(CONTENT_TYPE, "application/json"),
        };
        debug!(host = %self.connection.host(), "requesting bearer token");
        execute_catching(self.decorate(builder).await?).await
    }

    /// Adds the mode-specific headers: proxy credentials, or `X-Forwarded-For`.
    async fn decorate(&self, builder: RequestBuilder) -> Result<RequestBuilder, LatteError> {
        match &self.connection {
            ConnectionInfo::Direct { forwarded_for, .. } if !forwarded_for.is_empty() => {
                Ok(builder.header(FORWARDED_FOR, forwarded_for.as_str()))
            }
            ConnectionInfo::Direct { .. } => Ok(builder),
            ConnectionInfo::Proxy {
                host,
                credentials_provider: Some(provider),
            } => {
                let (name, value) = provider.provide(host).await?;
                Ok(builder.header(name, value))
            }
            ConnectionInfo::Proxy { .. } => Ok(builder),
        }
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}
