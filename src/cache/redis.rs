use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use crate::cache::backend::CacheBackend;
use crate::helpers::time::to_chrono;

/// Backend shared across proxy instances.
///
/// Expiry is enforced by Redis itself: entries are written with an absolute
/// `PXAT` deadline equal to the instant returned to the caller.
#[derive(Clone)]
pub struct RedisCacheBackend {
    connection: ConnectionManager,
    prefix: String,
}

impl RedisCacheBackend {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).with_context(|| format!("invalid redis url '{}'", url))?;
        let connection = ConnectionManager::new(client)
            .await
            .context("failed to connect to redis")?;
        Ok(Self {
            connection,
            prefix: "latte:".to_owned(),
        })
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl CacheBackend for RedisCacheBackend {
    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut conn = self.connection.clone();
        conn.set::<_, _, ()>(self.key(key), value)
            .await
            .context("redis SET failed")?;
        Ok(())
    }

    async fn write_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<DateTime<Utc>> {
        let expires_at = Utc::now()
            .checked_add_signed(to_chrono(ttl))
            .with_context(|| format!("ttl {:?} is out of range", ttl))?;
        let mut conn = self.connection.clone();
        redis::cmd("SET")
            .arg(self.key(key))
            .arg(value)
            .arg("PXAT")
            .arg(expires_at.timestamp_millis())
            .query_async::<()>(&mut conn)
            .await
            .context("redis SET PXAT failed")?;
        debug!(expires_at = %expires_at, "redis entry written");
        // PXAT has millisecond resolution; report what was stored.
        DateTime::from_timestamp_millis(expires_at.timestamp_millis())
            .context("expiry out of range")
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.connection.clone();
        let value: Option<Vec<u8>> = conn.get(self.key(key)).await.context("redis GET failed")?;
        Ok(value)
    }
}
