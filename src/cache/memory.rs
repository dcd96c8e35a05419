//! In-Memory Cache Store
//!
//! Concurrent entry map with TTL expiration and a key registry that backs
//! pattern removal. Expired entries are dropped lazily on read and actively by
//! the eviction sweeper.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::entry::{CacheEntry, EvictionCause};
use crate::cache::pattern::KeyPattern;
use crate::cache::registry::KeyRegistry;
use crate::cache::CacheStore;
use crate::tasks::{spawn_eviction_sweeper, ExpirySweep};

// == Shared State ==
/// State shared between the store handle and its sweeper.
#[derive(Debug, Default)]
pub(crate) struct MemoryState {
    entries: DashMap<String, CacheEntry>,
    registry: KeyRegistry,
    generation: AtomicU64,
}

impl MemoryState {
    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Removes `key` if its entry is expired, firing the hook.
    fn evict_if_expired(&self, key: &str) -> bool {
        match self.entries.remove_if(key, |_, entry| entry.is_expired()) {
            Some((key, entry)) => {
                entry.notify_evicted(&key, EvictionCause::Expired);
                true
            }
            None => false,
        }
    }

    /// Removes a registered key. A registration without an entry is dropped
    /// only if it still carries `generation`.
    fn evict(&self, key: &str, generation: u64, cause: EvictionCause) -> bool {
        match self.entries.remove(key) {
            Some((key, entry)) => {
                entry.notify_evicted(&key, cause);
                true
            }
            None => {
                self.registry.unregister(key, generation);
                false
            }
        }
    }

    /// Drops registrations whose key has no entry, returning how many.
    fn drop_orphans(&self) -> usize {
        self.registry
            .snapshot()
            .into_iter()
            .filter(|(key, _)| !self.entries.contains_key(key))
            .filter(|(key, generation)| self.registry.unregister(key, *generation))
            .count()
    }
}

impl ExpirySweep for MemoryState {
    fn evict_expired(&self) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|item| item.value().is_expired())
            .map(|item| item.key().clone())
            .collect();

        let evicted = expired
            .iter()
            .filter(|key| self.evict_if_expired(key))
            .count();

        let orphans = self.drop_orphans();
        if orphans > 0 {
            debug!(orphans = orphans, "Dropped registrations without entries");
        }
        evicted
    }
}

// == Memory Cache Store ==
/// In-process cache store.
///
/// Not `Clone`: share it behind an `Arc`. Dropping the store stops its sweeper.
#[derive(Debug)]
pub struct MemoryCacheStore {
    state: Arc<MemoryState>,
    sweeper: Option<JoinHandle<()>>,
}

impl MemoryCacheStore {
    // == Constructor ==
    /// Creates a store that only expires entries lazily on read.
    pub fn new() -> Self {
        Self {
            state: Arc::new(MemoryState::default()),
            sweeper: None,
        }
    }

    /// Creates a store with a background sweeper.
    ///
    /// The sweeper is only started when called inside a tokio runtime;
    /// otherwise the store falls back to lazy expiry.
    ///
    /// # Arguments
    /// * `interval` - Time between sweeps
    pub fn with_sweeper(interval: Duration) -> Self {
        let mut store = Self::new();

        if tokio::runtime::Handle::try_current().is_ok() {
            store.sweeper = Some(spawn_eviction_sweeper(
                Arc::downgrade(&store.state),
                interval,
            ));
        } else {
            warn!("No tokio runtime available, memory cache sweeper not started");
        }

        store
    }

    /// Removes every expired entry now, returning how many were dropped.
    pub fn evict_expired(&self) -> usize {
        self.state.evict_expired()
    }

    /// Number of entries currently held, expired or not.
    pub fn len(&self) -> usize {
        self.state.entries.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.state.entries.is_empty()
    }

    /// Number of keys in the registry.
    pub fn tracked_keys(&self) -> usize {
        self.state.registry.len()
    }

    /// Whether `key` is in the registry.
    pub fn is_tracked(&self, key: &str) -> bool {
        self.state.registry.contains(key)
    }

    /// Whether a background sweeper is attached.
    pub fn has_sweeper(&self) -> bool {
        self.sweeper.is_some()
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for MemoryCacheStore {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.take() {
            handle.abort();
        }
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Option<String> {
        let expired = match self.state.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Some(entry.value.clone()),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.state.evict_if_expired(key);
            debug!(key = key, "Expired entry evicted on read");
        }
        None
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> bool {
        if key.is_empty() || ttl.is_zero() {
            return false;
        }

        let generation = self.state.next_generation();
        let entry = CacheEntry::new(value, ttl, generation)
            .with_eviction_hook(self.state.registry.eviction_hook());

        // Registration happens under the shard guard so the registered
        // generation is always the one left in the map.
        let previous = match self.state.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                self.state.registry.register(key, generation);
                Some(occupied.insert(entry))
            }
            Entry::Vacant(vacant) => {
                self.state.registry.register(key, generation);
                vacant.insert(entry);
                None
            }
        };

        if let Some(previous) = previous {
            previous.notify_evicted(key, EvictionCause::Replaced);
        }
        true
    }

    async fn remove(&self, key: &str) {
        if let Some((key, entry)) = self.state.entries.remove(key) {
            entry.notify_evicted(&key, EvictionCause::Removed);
        }
    }

    async fn remove_by_pattern(&self, pattern: &str) {
        let pattern = match KeyPattern::new(pattern) {
            Ok(pattern) => pattern,
            Err(e) => {
                warn!(pattern = pattern, error = %e, "Ignoring invalid cache pattern");
                return;
            }
        };

        let removed = self
            .state
            .registry
            .matching(&pattern)
            .into_iter()
            .filter(|(key, generation)| {
                self.state
                    .evict(key, *generation, EvictionCause::PatternRemoved)
            })
            .count();

        debug!(pattern = pattern.as_str(), removed = removed, "Cache pattern removal");
    }

    async fn clear(&self) {
        let removed = self
            .state
            .registry
            .snapshot()
            .into_iter()
            .filter(|(key, generation)| self.state.evict(key, *generation, EvictionCause::Cleared))
            .count();

        debug!(removed = removed, "Memory cache cleared");
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}
