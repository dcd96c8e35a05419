//! Cache Module
//!
//! Pluggable cache stores (memory, distributed, null) behind one async
//! contract, plus the read-through decorator used by the cached services.
//!
//! Stores never fail from the caller's point of view: backend trouble is
//! logged and turns into a miss or a skipped write.

mod distributed;
mod entry;
mod memory;
mod null;
mod pattern;
mod read_through;
#[cfg(feature = "redis")]
mod redis_backend;
mod registry;
mod stats;

#[cfg(test)]
mod property_tests;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::{CacheOptions, CacheProviderKind};
use crate::error::{ApiError, ApiResult};

// Re-export public types
pub use distributed::{DistributedCacheStore, KeyValueBackend};
pub use entry::{CacheEntry, EvictionCause, EvictionHook};
pub use memory::MemoryCacheStore;
pub use null::NullCacheStore;
pub use pattern::KeyPattern;
pub use read_through::{CacheKey, ReadThroughCache};
#[cfg(feature = "redis")]
pub use redis_backend::RedisBackend;
pub use registry::KeyRegistry;
pub use stats::{CacheMetrics, CacheStats};

// == Cache Store Contract ==
/// Async string cache keyed by `&str`.
#[async_trait]
pub trait CacheStore: Send + Sync + fmt::Debug {
    /// Returns the stored value, or `None` when absent, expired or unavailable.
    async fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` for `ttl`, returning whether it was stored. Empty keys
    /// and zero TTLs are ignored.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> bool;

    /// Removes `key` if present.
    async fn remove(&self, key: &str);

    /// Removes every key matching a `*` wildcard pattern, case-insensitively.
    async fn remove_by_pattern(&self, pattern: &str);

    /// Removes every entry this store can enumerate.
    async fn clear(&self);

    /// Short provider name for logs.
    fn provider_name(&self) -> &'static str;
}

// == Typed Helpers ==
impl dyn CacheStore {
    /// Reads and decodes a JSON value. Undecodable entries count as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key).await?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(key = key, error = %e, "Discarding undecodable cache entry");
                None
            }
        }
    }

    /// Encodes and stores a JSON value, returning whether the store kept it.
    ///
    /// Values encoding to `null` are never stored, so an absent result is
    /// always fetched again.
    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> bool
    where
        T: Serialize + Sync + ?Sized,
    {
        if key.is_empty() || ttl.is_zero() {
            return false;
        }

        let raw = match serde_json::to_string(value) {
            Ok(raw) if raw != "null" => raw,
            Ok(_) => return false,
            Err(e) => {
                debug!(key = key, error = %e, "Skipping unencodable cache value");
                return false;
            }
        };

        self.set(key, raw, ttl).await
    }
}

// == Store Selection ==
/// Builds the store selected by `options`.
///
/// A disabled cache or the `None` provider yields a [`NullCacheStore`]. The
/// distributed provider requires `backend`.
pub fn build_cache_store(
    options: &CacheOptions,
    backend: Option<Arc<dyn KeyValueBackend>>,
) -> ApiResult<Arc<dyn CacheStore>> {
    if !options.is_active() {
        return Ok(Arc::new(NullCacheStore::new()));
    }

    match options.provider {
        CacheProviderKind::Memory => Ok(Arc::new(MemoryCacheStore::with_sweeper(
            options.sweep_interval,
        ))),
        CacheProviderKind::Distributed => match backend {
            Some(backend) => Ok(Arc::new(DistributedCacheStore::new(backend))),
            None => Err(ApiError::Configuration(
                "Distributed cache provider requires a key-value backend".to_string(),
            )),
        },
        CacheProviderKind::None => Ok(Arc::new(NullCacheStore::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        count: u32,
    }

    fn memory() -> Arc<dyn CacheStore> {
        Arc::new(MemoryCacheStore::new())
    }

    #[tokio::test]
    async fn test_json_round_trip() {
        let store = memory();
        let item = Item {
            id: "a".to_string(),
            count: 2,
        };

        store.set_json("k", &item, Duration::from_secs(10)).await;
        assert_eq!(store.get_json::<Item>("k").await, Some(item));
    }

    #[tokio::test]
    async fn test_null_value_not_stored() {
        let store = memory();
        let stored = store
            .set_json("k", &Option::<Item>::None, Duration::from_secs(10))
            .await;
        assert!(!stored);
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn test_empty_list_is_stored() {
        let store = memory();
        store
            .set_json("k", &Vec::<Item>::new(), Duration::from_secs(10))
            .await;
        assert_eq!(store.get_json::<Vec<Item>>("k").await, Some(vec![]));
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_miss() {
        let store = memory();
        store
            .set("k", "{\"unexpected\":true}".to_string(), Duration::from_secs(10))
            .await;
        assert_eq!(store.get_json::<Item>("k").await, None);
    }

    #[tokio::test]
    async fn test_build_store_by_provider() {
        let mut options = CacheOptions::default();
        let store = build_cache_store(&options, None).unwrap();
        assert_eq!(store.provider_name(), "memory");

        options.enabled = false;
        let store = build_cache_store(&options, None).unwrap();
        assert_eq!(store.provider_name(), "null");

        options.enabled = true;
        options.provider = CacheProviderKind::None;
        let store = build_cache_store(&options, None).unwrap();
        assert_eq!(store.provider_name(), "null");
    }

    #[test]
    fn test_distributed_requires_backend() {
        let options = CacheOptions {
            provider: CacheProviderKind::Distributed,
            ..CacheOptions::default()
        };
        assert!(matches!(
            build_cache_store(&options, None),
            Err(ApiError::Configuration(_))
        ));
    }
}
