use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::cache::CacheBackend;
use crate::server::auth::HeaderValidator;
use crate::token::generator::TokenGenerator;

/// Accepts any value carrying the issuer prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrefixValidator {
    generator: TokenGenerator,
}

impl PrefixValidator {
    pub fn new(generator: TokenGenerator) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl HeaderValidator for PrefixValidator {
    async fn validate(&self, value: &str) -> bool {
        self.generator.verify(value)
    }
}

/// Accepts a value only if it has the issuer prefix and its issuance record
/// is still live in the cache backend.
#[derive(Clone)]
pub struct IssuedTokenValidator {
    generator: TokenGenerator,
    issued: Arc<dyn CacheBackend>,
}

impl IssuedTokenValidator {
    pub fn new(generator: TokenGenerator, issued: Arc<dyn CacheBackend>) -> Self {
        Self { generator, issued }
    }
}

#[async_trait]
impl HeaderValidator for IssuedTokenValidator {
    async fn validate(&self, value: &str) -> bool {
        if !self.generator.verify(value) {
            return false;
        }
        match self.issued.read(value).await {
            Ok(entry) => entry.is_some(),
            Err(e) => {
                warn!(error = %e, "issued-token lookup failed");
                false
            }
        }
    }
}
