//! Write-through cache over the durable variable store.
//!
//! Consistency contract:
//!
//! * Reads are served from the cache only. A miss is a miss; the store is
//!   never consulted after [`GlobalVariables::load`].
//! * Writes update the cache first and then the store, synchronously. When
//!   the store write fails the cache write stands and the error is returned
//!   for the caller to log, so cache and store may diverge until the next
//!   successful write of that key.
//! * Concurrent writers to one key race; the last write wins.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::provider::capabilities::storage::{StorageError, VariableStore};

pub struct GlobalVariables {
    cache: DashMap<String, String>,
    store: Arc<dyn VariableStore>,
}

impl GlobalVariables {
    pub fn new(store: Arc<dyn VariableStore>) -> Self {
        Self {
            cache: DashMap::new(),
            store,
        }
    }

    /// Replace the cache with the full store contents.
    ///
    /// On failure the cache is left untouched.
    pub fn load(&self) -> Result<usize, StorageError> {
        let all = self.store.load_all()?;
        let count = all.len();
        self.cache.clear();
        for (key, value) in all {
            self.cache.insert(key, value);
        }
        Ok(count)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.cache.get(key).map(|v| v.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cache.contains_key(key)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.cache.insert(key.to_string(), value.to_string());
        self.store.save(key, value)
    }

    pub fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.cache.remove(key);
        self.store.delete(key)
    }

    /// Cached entries whose key starts with `prefix`, ordered by key.
    pub fn with_prefix(&self, prefix: &str) -> BTreeMap<String, String> {
        self.cache
            .iter()
            .filter(|e| e.key().starts_with(prefix))
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Remove every key starting with `prefix` from cache and store.
    ///
    /// Returns the number of keys the store removed.
    pub fn delete_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        self.cache.retain(|k, _| !k.starts_with(prefix));
        self.store.delete_by_prefix(prefix)
    }

    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn stored(&self) -> Result<usize, StorageError> {
        self.store.count()
    }
}
