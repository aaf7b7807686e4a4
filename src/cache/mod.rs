//! Expiring key/value storage used by the proxy for issued-token bookkeeping.

pub mod backend;
pub mod memory;
#[cfg(feature = "redis")]
pub mod redis;

pub use backend::{CacheBackend, CachedEntry};
pub use memory::MemoryCacheBackend;
#[cfg(feature = "redis")]
pub use self::redis::RedisCacheBackend;
