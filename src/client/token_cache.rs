use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::LatteError;
use crate::helpers::time::{to_chrono, Clock, SystemClock};
use crate::models::TokenResponse;

/// Refresh boundary for upstream bearer tokens, counted from issuance.
pub const DEFAULT_TOKEN_VALIDITY: Duration = Duration::from_secs(420);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken {
    pub value: String,
    pub issued_at: DateTime<Utc>,
}

impl BearerToken {
    pub fn is_fresh_at(&self, now: DateTime<Utc>, validity: chrono::Duration) -> bool {
        now - self.issued_at < validity
    }
}

/// Holds the most recent bearer token.
///
/// A cached token is used while `now - issued_at < validity`; after that
/// [`get_token`](Self::get_token) fetches a new one. Concurrent callers that
/// all see a stale token each fetch independently. The cached value is
/// swapped as a whole, and only after a fetch succeeded, so a failed or
/// cancelled refresh leaves the previous token in place.
#[derive(Debug)]
pub struct TokenCache {
    current: RwLock<Option<Arc<BearerToken>>>,
    validity: chrono::Duration,
    clock: Arc<dyn Clock>,
}

impl Default for TokenCache {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_VALIDITY, Arc::new(SystemClock))
    }
}

impl TokenCache {
    pub fn new(validity: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            current: RwLock::new(None),
            validity: to_chrono(validity),
            clock,
        }
    }

    /// Cached token if it is still inside the validity window.
    pub fn fresh(&self) -> Option<Arc<BearerToken>> {
        let now = self.clock.now();
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|token| token.is_fresh_at(now, self.validity))
            .cloned()
    }

    pub async fn get_token<F, Fut>(&self, fetch: F) -> Result<String, LatteError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenResponse, LatteError>>,
    {
        if let Some(token) = self.fresh() {
            return Ok(token.value.clone());
        }
        debug!("bearer token missing or stale, refreshing");
        Ok(self.refresh(fetch).await?.token)
    }

    /// Fetches unconditionally and replaces the cached token on success.
    pub async fn refresh<F, Fut>(&self, fetch: F) -> Result<TokenResponse, LatteError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<TokenResponse, LatteError>>,
    {
        let response = fetch().await?;
        let token = Arc::new(BearerToken {
            value: response.token.clone(),
            issued_at: self.clock.now(),
        });
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
        Ok(response)
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
