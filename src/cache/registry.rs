//! Key Registry Module
//!
//! Index of live keys for the memory store. The entry map is only ever
//! addressed by exact key; pattern removal and clear enumerate this registry.

use std::sync::Arc;

use dashmap::DashMap;

use crate::cache::entry::{EvictionCause, EvictionHook};
use crate::cache::pattern::KeyPattern;

// == Key Registry ==
/// Concurrent set of live keys, each tagged with the generation that inserted it.
#[derive(Debug, Clone, Default)]
pub struct KeyRegistry {
    keys: Arc<DashMap<String, u64>>,
}

impl KeyRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key` as live at `generation`.
    pub fn register(&self, key: &str, generation: u64) {
        self.keys.insert(key.to_string(), generation);
    }

    /// Forgets `key`, but only if it is still registered at `generation`.
    ///
    /// A late eviction of an older entry never drops a newer registration.
    pub fn unregister(&self, key: &str, generation: u64) -> bool {
        self.keys
            .remove_if(key, |_, registered| *registered == generation)
            .is_some()
    }

    /// Whether `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    /// Snapshot of registered keys matching `pattern`, with their generations.
    pub fn matching(&self, pattern: &KeyPattern) -> Vec<(String, u64)> {
        self.keys
            .iter()
            .filter(|item| pattern.matches(item.key()))
            .map(|item| (item.key().clone(), *item.value()))
            .collect()
    }

    /// Snapshot of every registered key with its generation.
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        self.keys
            .iter()
            .map(|item| (item.key().clone(), *item.value()))
            .collect()
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no key is registered.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    // == Eviction Hook ==
    /// Hook to attach to entries at insertion time.
    ///
    /// Touches nothing but this registry. Replacement is ignored because the
    /// replacing `set` registers its own generation.
    pub fn eviction_hook(&self) -> EvictionHook {
        let registry = self.clone();
        Arc::new(move |key: &str, generation: u64, cause: EvictionCause| {
            if cause != EvictionCause::Replaced {
                registry.unregister(key, generation);
            }
        })
    }
}
