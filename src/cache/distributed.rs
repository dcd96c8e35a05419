//! Distributed Cache Store
//!
//! Delegates to an external key-value service. The backend contract has no
//! key enumeration, so pattern removal and clear are no-ops here; entries
//! written through this store rely on their TTL to go away.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::error::CacheResult;

// == Key-Value Backend ==
/// Minimal contract of an external key-value service.
#[async_trait]
pub trait KeyValueBackend: Send + Sync + fmt::Debug {
    /// Reads the string stored at `key`.
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` at `key` with an absolute expiry `ttl` from now.
    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Deletes `key`; deleting a missing key is not an error.
    async fn remove(&self, key: &str) -> CacheResult<()>;

    /// Short backend name for logs.
    fn backend_name(&self) -> &'static str {
        "external"
    }
}

// == Distributed Cache Store ==
/// Cache store over a [`KeyValueBackend`]. Backend failures are logged and
/// degrade to a miss or a skipped write.
#[derive(Debug, Clone)]
pub struct DistributedCacheStore {
    backend: Arc<dyn KeyValueBackend>,
}

impl DistributedCacheStore {
    /// Wraps `backend`.
    pub fn new(backend: Arc<dyn KeyValueBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl CacheStore for DistributedCacheStore {
    async fn get(&self, key: &str) -> Option<String> {
        match self.backend.get_string(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(
                    key = key,
                    backend = self.backend.backend_name(),
                    error = %e,
                    "Cache read failed, treating as miss"
                );
                None
            }
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> bool {
        if key.is_empty() || ttl.is_zero() {
            return false;
        }

        match self.backend.set_string(key, &value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    key = key,
                    backend = self.backend.backend_name(),
                    error = %e,
                    "Cache write failed, skipping"
                );
                false
            }
        }
    }

    async fn remove(&self, key: &str) {
        if let Err(e) = self.backend.remove(key).await {
            warn!(
                key = key,
                backend = self.backend.backend_name(),
                error = %e,
                "Cache remove failed"
            );
        }
    }

    async fn remove_by_pattern(&self, pattern: &str) {
        debug!(
            pattern = pattern,
            backend = self.backend.backend_name(),
            "Pattern removal not supported by distributed cache, entries expire by TTL"
        );
    }

    async fn clear(&self) {
        debug!(
            backend = self.backend.backend_name(),
            "Clear not supported by distributed cache, entries expire by TTL"
        );
    }

    fn provider_name(&self) -> &'static str {
        "distributed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use dashmap::DashMap;

    #[derive(Debug, Default)]
    struct MapBackend {
        values: DashMap<String, (String, Duration)>,
    }

    #[async_trait]
    impl KeyValueBackend for MapBackend {
        async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
            Ok(self.values.get(key).map(|item| item.0.clone()))
        }

        async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
            self.values
                .insert(key.to_string(), (value.to_string(), ttl));
            Ok(())
        }

        async fn remove(&self, key: &str) -> CacheResult<()> {
            self.values.remove(key);
            Ok(())
        }
    }

    #[derive(Debug)]
    struct FailingBackend;

    #[async_trait]
    impl KeyValueBackend for FailingBackend {
        async fn get_string(&self, _key: &str) -> CacheResult<Option<String>> {
            Err(CacheError::Connection("refused".to_string()))
        }

        async fn set_string(&self, _key: &str, _value: &str, _ttl: Duration) -> CacheResult<()> {
            Err(CacheError::Backend("read-only".to_string()))
        }

        async fn remove(&self, _key: &str) -> CacheResult<()> {
            Err(CacheError::Connection("refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_delegates_to_backend() {
        let backend = Arc::new(MapBackend::default());
        let store = DistributedCacheStore::new(backend.clone());

        assert!(store.set("k", "1".to_string(), Duration::from_secs(30)).await);
        assert_eq!(store.get("k").await, Some("1".to_string()));
        assert_eq!(
            backend.values.get("k").map(|item| item.1),
            Some(Duration::from_secs(30))
        );

        store.remove("k").await;
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn test_backend_failures_degrade_silently() {
        let store = DistributedCacheStore::new(Arc::new(FailingBackend));

        assert!(!store.set("k", "1".to_string(), Duration::from_secs(30)).await);
        assert_eq!(store.get("k").await, None);
        store.remove("k").await;
    }

    #[tokio::test]
    async fn test_pattern_removal_and_clear_are_noops() {
        let backend = Arc::new(MapBackend::default());
        let store = DistributedCacheStore::new(backend.clone());
        store.set("ns:1", "1".to_string(), Duration::from_secs(30)).await;

        store.remove_by_pattern("ns:*").await;
        store.clear().await;

        assert_eq!(backend.values.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_ttl_not_forwarded() {
        let backend = Arc::new(MapBackend::default());
        let store = DistributedCacheStore::new(backend.clone());
        store.set("k", "1".to_string(), Duration::ZERO).await;
        assert!(backend.values.is_empty());
    }
}
