//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support and
//! the eviction hook registered when the entry is inserted.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

// == Eviction Cause ==
/// Why an entry left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionCause {
    /// TTL elapsed (found on read or by the sweeper)
    Expired,
    /// Explicit `remove`
    Removed,
    /// Matched a `remove_by_pattern` call
    PatternRemoved,
    /// `clear` was called
    Cleared,
    /// A newer `set` on the same key took its place
    Replaced,
}

/// Callback invoked once when an entry leaves the store.
///
/// Receives the key, the generation the entry was inserted with, and the cause.
pub type EvictionHook = Arc<dyn Fn(&str, u64, EvictionCause) + Send + Sync>;

// == Cache Entry ==
/// Represents a single cache entry with its serialized value and expiry.
#[derive(Clone)]
pub struct CacheEntry {
    /// The stored value, serialized as JSON
    pub value: String,
    /// Insertion instant
    pub created_at: Instant,
    /// Absolute expiration instant
    pub expires_at: Instant,
    /// Insertion generation, unique per store
    pub generation: u64,
    on_evict: Option<EvictionHook>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry expiring `ttl` from now.
    ///
    /// # Arguments
    /// * `value` - The serialized value to store
    /// * `ttl` - Time to live, must be non-zero
    /// * `generation` - Insertion generation assigned by the store
    pub fn new(value: String, ttl: Duration, generation: u64) -> Self {
        let now = Instant::now();

        Self {
            value,
            created_at: now,
            expires_at: now + ttl,
            generation,
            on_evict: None,
        }
    }

    /// Attaches the hook fired when this entry is evicted.
    pub fn with_eviction_hook(mut self, hook: EvictionHook) -> Self {
        self.on_evict = Some(hook);
        self
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration instant.
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    // == Time To Live ==
    /// Remaining time to live, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    // == Evict ==
    /// Fires the eviction hook, if any, for `key`.
    pub fn notify_evicted(&self, key: &str, cause: EvictionCause) {
        if let Some(hook) = &self.on_evict {
            hook(key, self.generation, cause);
        }
    }
}

impl fmt::Debug for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEntry")
            .field("value_len", &self.value.len())
            .field("expires_at", &self.expires_at)
            .field("generation", &self.generation)
            .field("has_hook", &self.on_evict.is_some())
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[tokio::test(start_paused = true)]
    async fn test_entry_expiration() {
        let entry = CacheEntry::new("\"v\"".to_string(), Duration::from_secs(1), 1);
        assert!(!entry.is_expired());

        tokio::time::advance(Duration::from_millis(1100)).await;

        assert!(entry.is_expired());
        assert_eq!(entry.ttl_remaining(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_remaining() {
        let entry = CacheEntry::new("1".to_string(), Duration::from_secs(10), 1);
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(entry.ttl_remaining(), Duration::from_secs(6));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry {
            value: "test".to_string(),
            created_at: now,
            expires_at: now,
            generation: 0,
            on_evict: None,
        };

        assert!(entry.is_expired(), "Entry should be expired at boundary");
    }

    #[test]
    fn test_eviction_hook_receives_key_generation_and_cause() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let hook: EvictionHook = Arc::new(move |key: &str, generation: u64, cause: EvictionCause| {
            sink.lock().unwrap().push((key.to_string(), generation, cause));
        });

        let entry = CacheEntry::new("1".to_string(), Duration::from_secs(5), 7)
            .with_eviction_hook(hook);
        entry.notify_evicted("k", EvictionCause::Removed);

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[("k".to_string(), 7, EvictionCause::Removed)]
        );
    }

    #[test]
    fn test_entry_without_hook_is_silent() {
        let entry = CacheEntry::new("1".to_string(), Duration::from_secs(5), 1);
        entry.notify_evicted("k", EvictionCause::Expired);
    }
}
