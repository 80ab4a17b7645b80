//! Durable storage capability for global variables.
//!
//! The [`VariableStore`] trait is the only persistence surface the scripting
//! core depends on. Backends keep one row per global variable, shaped like a
//! single-table schema:
//!
//! | column       | meaning                                   |
//! |--------------|-------------------------------------------|
//! | `name`       | primary key, the variable name            |
//! | `value`      | the string value                          |
//! | `type`       | value type tag, currently always `string` |
//! | `updated_at` | epoch milliseconds of the last write      |
//!
//! `save` is last-write-wins and there is no versioning.
//!
//! # Thread Safety
//!
//! A store is one shared handle used by every concurrent invocation.
//! Implementations must serialise their own writes; callers never lock.
//!
//! # Usage Example
//!
//! ```
//! use vsk::provider::capabilities::storage::VariableStore;
//! use vsk::provider::plugins::storage::in_memory::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! store.save("coins::Alice", "10").unwrap();
//! assert_eq!(store.load("coins::Alice").unwrap().as_deref(), Some("10"));
//! assert_eq!(store.delete_by_prefix("coins::").unwrap(), 1);
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Type tag stored alongside every value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum VariableType {
    #[default]
    String,
}

/// One persisted global variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVariable {
    pub name: String,
    pub value: String,
    #[serde(rename = "type", default)]
    pub value_type: VariableType,
    /// Epoch milliseconds of the last write
    pub updated_at: i64,
}

impl StoredVariable {
    /// Build a row stamped with the current time.
    pub fn now(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            value_type: VariableType::String,
            updated_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Durable key/value persistence for global variables.
///
/// All operations are synchronous and bounded. Deleting a key that does not
/// exist is not an error.
#[cfg_attr(test, mockall::automock)]
pub trait VariableStore: Send + Sync {
    /// Insert or replace `key`.
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Load a single value.
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Remove `key` if present.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Load every stored variable.
    fn load_all(&self) -> Result<HashMap<String, String>, StorageError>;

    /// Remove every key starting with `prefix`, returning how many were removed.
    fn delete_by_prefix(&self, prefix: &str) -> Result<usize, StorageError>;

    /// Number of stored variables.
    fn count(&self) -> Result<usize, StorageError>;
}

/// Errors that can occur during storage operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
