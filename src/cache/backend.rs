use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Expiring key/value store.
///
/// Reads never return a value whose expiry instant has passed, whether or not
/// the entry was physically evicted. A miss is `Ok(None)`, not an error.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Stores `value` with no expiry.
    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Stores `value` until `now + ttl` and returns that instant, exactly as recorded.
    async fn write_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<DateTime<Utc>>;

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
}

/// Stored value plus optional absolute expiry; `None` never expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedEntry {
    pub value: Vec<u8>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedEntry {
    pub fn new(value: Vec<u8>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { value, expires_at }
    }

    /// An entry is live up to and including its expiry instant.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires_at| now <= expires_at)
    }
}
