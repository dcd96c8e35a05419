//! Null cache store
//!
//! Never stores anything. Used when caching is disabled.

use std::time::Duration;

use async_trait::async_trait;

use crate::cache::CacheStore;

/// Cache store whose reads always miss and whose writes are discarded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCacheStore;

impl NullCacheStore {
    /// Create a new null store
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CacheStore for NullCacheStore {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> bool {
        false
    }

    async fn remove(&self, _key: &str) {}

    async fn remove_by_pattern(&self, _pattern: &str) {}

    async fn clear(&self) {}

    fn provider_name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_get_after_set_is_empty() {
        let store = NullCacheStore::new();
        assert!(!store.set("key", "1".to_string(), Duration::from_secs(60)).await);
        assert_eq!(store.get("key").await, None);
    }

    #[tokio::test]
    async fn test_null_operations_complete_immediately() {
        let store = NullCacheStore::new();
        tokio_test::assert_ready!(tokio_test::task::spawn(store.remove("key")).poll());
        tokio_test::assert_ready!(tokio_test::task::spawn(store.remove_by_pattern("ns:*")).poll());
        tokio_test::assert_ready!(tokio_test::task::spawn(store.clear()).poll());
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(NullCacheStore::new().provider_name(), "null");
    }
}
