//! In-memory variable store.
//!
//! Nothing survives the process. Used when no storage file is configured
//! and throughout the tests.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::provider::capabilities::storage::{StorageError, StoredVariable, VariableStore};

/// In-memory backend for global variables
///
/// Cloning is cheap and every clone shares the same rows.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    rows: Arc<DashMap<String, StoredVariable>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full row for `key`, including its type tag and timestamp.
    pub fn row(&self, key: &str) -> Option<StoredVariable> {
        self.rows.get(key).map(|r| r.value().clone())
    }
}

impl VariableStore for InMemoryStore {
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.rows
            .insert(key.to_string(), StoredVariable::now(key, value));
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.rows.get(key).map(|r| r.value.clone()))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.rows.remove(key);
        Ok(())
    }

    fn load_all(&self) -> Result<HashMap<String, String>, StorageError> {
        Ok(self
            .rows
            .iter()
            .map(|r| (r.key().clone(), r.value.clone()))
            .collect())
    }

    fn delete_by_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let before = self.rows.len();
        self.rows.retain(|k, _| !k.starts_with(prefix));
        Ok(before.saturating_sub(self.rows.len()))
    }

    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.rows.len())
    }
}
