use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::backend::{CacheBackend, CachedEntry};
use crate::helpers::time::{saturating_add, to_chrono, Clock, SystemClock};

/// In-process backend. One lock serializes every read and write, which keeps
/// it to a single node and modest key counts.
#[derive(Debug, Clone)]
pub struct MemoryCacheBackend {
    inner: Arc<Mutex<HashMap<String, CachedEntry>>>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryCacheBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCacheBackend {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            clock,
        }
    }

    /// Physically drops expired entries, returning how many went.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut map = self.inner.lock().await;
        let before = map.len();
        map.retain(|_, entry| entry.is_live_at(now));
        before - map.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    /// Spawns a task that calls [`purge_expired`](Self::purge_expired) every `every`.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let backend = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let purged = backend.purge_expired().await;
                if purged > 0 {
                    debug!(purged, "expired cache entries removed");
                }
            }
        })
    }
}

#[async_trait]
impl CacheBackend for MemoryCacheBackend {
    async fn write(&self, key: &str, value: Vec<u8>) -> Result<()> {
        let mut map = self.inner.lock().await;
        map.insert(key.to_owned(), CachedEntry::new(value, None));
        Ok(())
    }

    async fn write_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<DateTime<Utc>> {
        let expires_at = saturating_add(self.clock.now(), to_chrono(ttl));
        let mut map = self.inner.lock().await;
        map.insert(key.to_owned(), CachedEntry::new(value, Some(expires_at)));
        Ok(expires_at)
    }

    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = self.clock.now();
        let map = self.inner.lock().await;
        Ok(map
            .get(key)
            .filter(|entry| entry.is_live_at(now))
            .map(|entry| entry.value.clone()))
    }
}
