//! Read-through caching
//!
//! Keys have the form `{prefix}:{domain}:{operation}[:{args}]`, where `args`
//! is the compact JSON encoding of the call arguments. Reads consult the
//! store first; writes invalidate every key of their domain.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheMetrics, CacheStore};
use crate::config::CacheOptions;
use crate::error::{ApiError, ApiResult};

// == Cache Key ==
/// Deterministic cache key for one operation call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds a key. Arguments encoding to `null` (such as `()`) add no segment.
    ///
    /// # Arguments
    /// * `prefix` - Key prefix shared by the whole client
    /// * `domain` - Service domain, e.g. `categories`
    /// * `operation` - Operation name within the domain
    /// * `args` - Call arguments; tuples encode as JSON arrays
    pub fn new<A>(prefix: &str, domain: &str, operation: &str, args: &A) -> ApiResult<Self>
    where
        A: Serialize + ?Sized,
    {
        let args = serde_json::to_string(args)
            .map_err(|e| ApiError::Serialization(format!("cache key arguments: {}", e)))?;

        if args == "null" {
            Ok(Self(format!("{}:{}:{}", prefix, domain, operation)))
        } else {
            Ok(Self(format!("{}:{}:{}:{}", prefix, domain, operation, args)))
        }
    }

    /// The key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// == Read-Through Cache ==
/// Read-through decorator logic for one service domain.
#[derive(Debug, Clone)]
pub struct ReadThroughCache {
    store: Arc<dyn CacheStore>,
    key_prefix: String,
    default_ttl: Duration,
    domain: &'static str,
    metrics: Option<Arc<CacheMetrics>>,
}

impl ReadThroughCache {
    /// Creates the decorator for `domain`.
    ///
    /// # Arguments
    /// * `store` - Backing cache store
    /// * `options` - Supplies the key prefix and TTL
    /// * `domain` - Second key segment, also the invalidation scope
    /// * `metrics` - Shared counters, when metrics are enabled
    pub fn new(
        store: Arc<dyn CacheStore>,
        options: &CacheOptions,
        domain: &'static str,
        metrics: Option<Arc<CacheMetrics>>,
    ) -> Self {
        Self {
            store,
            key_prefix: options.key_prefix.clone(),
            default_ttl: options.default_ttl,
            domain,
            metrics,
        }
    }

    /// Domain this decorator caches.
    pub fn domain(&self) -> &'static str {
        self.domain
    }

    // == Key ==
    /// Builds the key of `operation` called with `args` in this domain.
    pub fn key<A>(&self, operation: &str, args: &A) -> ApiResult<CacheKey>
    where
        A: Serialize + ?Sized,
    {
        CacheKey::new(&self.key_prefix, self.domain, operation, args)
    }

    /// Wildcard pattern matching every key of this domain.
    pub fn domain_pattern(&self) -> String {
        format!("{}:{}:*", self.key_prefix, self.domain)
    }

    // == Read ==
    /// Returns the cached value for `key`, or calls `fetch` and caches its result.
    ///
    /// Errors from `fetch` are returned unchanged and never cached. A result
    /// encoding to `null` is returned but not stored.
    pub async fn get_or_fetch<T, F, Fut>(&self, key: &CacheKey, fetch: F) -> ApiResult<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = ApiResult<T>> + Send,
    {
        if let Some(value) = self.store.get_json::<T>(key.as_str()).await {
            debug!(key = %key, "Cache HIT");
            self.record(CacheMetrics::record_hit);
            return Ok(value);
        }

        debug!(key = %key, "Cache MISS");
        self.record(CacheMetrics::record_miss);

        let value = fetch().await?;
        if self
            .store
            .set_json(key.as_str(), &value, self.default_ttl)
            .await
        {
            self.record(CacheMetrics::record_write);
        }

        Ok(value)
    }

    // == Invalidate ==
    /// Drops every key of this domain, plus `exact` if given.
    ///
    /// Called after a successful write; `exact` covers stores that cannot
    /// enumerate keys.
    pub async fn invalidate(&self, exact: Option<&CacheKey>) {
        let pattern = self.domain_pattern();
        self.store.remove_by_pattern(&pattern).await;

        if let Some(key) = exact {
            self.store.remove(key.as_str()).await;
        }

        debug!(domain = self.domain, pattern = %pattern, "Cache domain invalidated");
        self.record(CacheMetrics::record_invalidation);
    }

    fn record(&self, counter: fn(&CacheMetrics)) {
        if let Some(metrics) = &self.metrics {
            counter(metrics);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCacheStore, NullCacheStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache_with(store: Arc<dyn CacheStore>, domain: &'static str) -> ReadThroughCache {
        ReadThroughCache::new(
            store,
            &CacheOptions::default(),
            domain,
            Some(Arc::new(CacheMetrics::new())),
        )
    }

    #[test]
    fn test_key_without_args() {
        let key = CacheKey::new("qutora", "categories", "all", &()).unwrap();
        assert_eq!(key.as_str(), "qutora:categories:all");
    }

    #[test]
    fn test_key_with_args() {
        let key = CacheKey::new("qutora", "categories", "by-id", "c1").unwrap();
        assert_eq!(key.as_str(), "qutora:categories:by-id:\"c1\"");

        let key = CacheKey::new("qutora", "categories", "paged", &(1, 10, None::<&str>)).unwrap();
        assert_eq!(key.as_str(), "qutora:categories:paged:[1,10,null]");
    }

    #[test]
    fn test_distinct_args_never_collide() {
        let a = CacheKey::new("p", "d", "op", &("a:b", "c")).unwrap();
        let b = CacheKey::new("p", "d", "op", &("a", "b:c")).unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_miss_fetches_then_hit_skips_source() {
        let cache = cache_with(Arc::new(MemoryCacheStore::new()), "categories");
        let key = cache.key("all", &()).unwrap();
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Vec<String> = cache
                .get_or_fetch(&key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec!["a".to_string()])
                })
                .await
                .unwrap();
            assert_eq!(value, vec!["a".to_string()]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let stats = cache.metrics.as_ref().unwrap().snapshot();
        assert_eq!((stats.hits, stats.misses, stats.writes), (2, 1, 1));
    }

    #[tokio::test]
    async fn test_source_error_not_cached() {
        let cache = cache_with(Arc::new(MemoryCacheStore::new()), "categories");
        let key = cache.key("by-id", "x").unwrap();

        let result: ApiResult<String> = cache
            .get_or_fetch(&key, || async { Err(ApiError::from_status(503, "")) })
            .await;
        assert!(matches!(result, Err(ApiError::Server { status: 503, .. })));

        let value: String = cache
            .get_or_fetch(&key, || async { Ok("ok".to_string()) })
            .await
            .unwrap();
        assert_eq!(value, "ok");
    }

    #[tokio::test]
    async fn test_absent_result_refetched() {
        let cache = cache_with(Arc::new(MemoryCacheStore::new()), "categories");
        let key = cache.key("by-id", "missing").unwrap();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Option<String> = cache
                .get_or_fetch(&key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(None)
                })
                .await
                .unwrap();
            assert_eq!(value, None);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let stats = cache.metrics.as_ref().unwrap().snapshot();
        assert_eq!((stats.misses, stats.writes), (2, 0));
    }

    #[tokio::test]
    async fn test_invalidate_scoped_to_domain() {
        let store: Arc<dyn CacheStore> = Arc::new(MemoryCacheStore::new());
        let categories = cache_with(store.clone(), "categories");
        let metadata = cache_with(store.clone(), "metadata");

        let category_key = categories.key("all", &()).unwrap();
        let metadata_key = metadata.key("tags", &()).unwrap();
        store.set_json(category_key.as_str(), &vec![1], Duration::from_secs(60)).await;
        store.set_json(metadata_key.as_str(), &vec![2], Duration::from_secs(60)).await;

        categories.invalidate(None).await;

        assert_eq!(store.get(category_key.as_str()).await, None);
        assert!(store.get(metadata_key.as_str()).await.is_some());
    }

    #[tokio::test]
    async fn test_null_store_always_fetches() {
        let cache = cache_with(Arc::new(NullCacheStore::new()), "storage");
        let key = cache.key("providers", &()).unwrap();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let _: Vec<u8> = cache
                .get_or_fetch(&key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1])
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let stats = cache.metrics.as_ref().unwrap().snapshot();
        assert_eq!((stats.misses, stats.writes), (2, 0));
    }
}
