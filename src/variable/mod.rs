//! Script variables.
//!
//! Every variable is addressed by a bracketed name. `{name}` is global: it is
//! cached in memory, persisted through a
//! [`VariableStore`](crate::provider::capabilities::storage::VariableStore)
//! and visible to every invocation. `{_name}` is local: it lives in the scope
//! of one invocation and disappears with it. `{list::key}` is an ordinary
//! variable whose name happens to contain `::`; lists are enumerated by key
//! prefix.
//!
//! [`VariableManager`] is the only public entry point. Scopes are normally
//! held through a [`ScopeGuard`], which releases the scope when dropped.

pub mod access;
pub mod global;
pub mod registry;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

pub use access::VariableAccess;
pub use registry::ScopeId;

use crate::provider::capabilities::storage::VariableStore;
use global::GlobalVariables;
use registry::ScopeRegistry;

/// Snapshot of variable bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableStats {
    /// Globals held in the cache
    pub cached: usize,
    /// Rows in the store, `None` when the store could not be counted
    pub stored: Option<usize>,
    /// Scopes currently alive
    pub scopes: usize,
}

pub struct VariableManager {
    globals: GlobalVariables,
    scopes: ScopeRegistry,
}

impl VariableManager {
    pub fn new(store: Arc<dyn VariableStore>) -> Self {
        Self {
            globals: GlobalVariables::new(store),
            scopes: ScopeRegistry::new(),
        }
    }

    /// Load every durable variable into the cache, replacing its contents.
    ///
    /// Returns the number of variables loaded, or 0 when the store failed
    /// (the previous cache is kept in that case).
    pub fn load_globals(&self) -> usize {
        match self.globals.load() {
            Ok(count) => {
                info!("Loaded {} global variable(s) from storage", count);
                count
            }
            Err(e) => {
                error!("Failed to load global variables from storage: {}", e);
                0
            }
        }
    }

    pub fn create_scope(&self) -> ScopeId {
        let id = self.scopes.create();
        debug!("Created scope {}", id);
        id
    }

    pub fn destroy_scope(&self, id: ScopeId) {
        if self.scopes.destroy(id) {
            debug!("Destroyed scope {}", id);
        }
    }

    /// Create a scope that is destroyed when the returned guard drops.
    pub fn scoped(self: &Arc<Self>) -> ScopeGuard {
        ScopeGuard {
            id: self.create_scope(),
            manager: Arc::clone(self),
        }
    }

    pub fn set(&self, scope: ScopeId, name: &str, value: &str) {
        match VariableAccess::parse(name) {
            Some(VariableAccess::Local(key)) => self.scopes.set(scope, &key, value),
            Some(VariableAccess::Global(key)) => {
                if let Err(e) = self.globals.set(&key, value) {
                    error!("Failed to save global variable '{}' to storage: {}", key, e);
                }
            }
            None => warn!("Ignoring write to malformed variable name '{}'", name),
        }
    }

    pub fn get(&self, scope: ScopeId, name: &str) -> Option<String> {
        match VariableAccess::parse(name)? {
            VariableAccess::Local(key) => self.scopes.get(scope, &key),
            VariableAccess::Global(key) => self.globals.get(&key),
        }
    }

    pub fn is_set(&self, scope: ScopeId, name: &str) -> bool {
        match VariableAccess::parse(name) {
            Some(VariableAccess::Local(key)) => self.scopes.contains(scope, &key),
            Some(VariableAccess::Global(key)) => self.globals.contains(&key),
            None => false,
        }
    }

    pub fn delete(&self, scope: ScopeId, name: &str) {
        match VariableAccess::parse(name) {
            Some(VariableAccess::Local(key)) => self.scopes.delete(scope, &key),
            Some(VariableAccess::Global(key)) => {
                if let Err(e) = self.globals.delete(&key) {
                    error!(
                        "Failed to delete global variable '{}' from storage: {}",
                        key, e
                    );
                }
            }
            None => warn!("Ignoring delete of malformed variable name '{}'", name),
        }
    }

    /// Entries of a global list such as `{coins::*}`, keyed by full name.
    pub fn list_entries(&self, list_name: &str) -> BTreeMap<String, String> {
        match access::list_prefix(list_name) {
            Some(VariableAccess::Global(prefix)) => self.globals.with_prefix(&prefix),
            Some(VariableAccess::Local(_)) => {
                warn!("Local list iteration is not supported: {}", list_name);
                BTreeMap::new()
            }
            None => BTreeMap::new(),
        }
    }

    /// Delete every entry of a global list such as `{coins::*}`.
    pub fn delete_list(&self, list_name: &str) {
        match access::list_prefix(list_name) {
            Some(VariableAccess::Global(prefix)) => match self.globals.delete_prefix(&prefix) {
                Ok(count) => debug!("Deleted {} entries of list {}", count, list_name),
                Err(e) => error!("Failed to delete list '{}' from storage: {}", list_name, e),
            },
            Some(VariableAccess::Local(_)) => {
                warn!("Local list deletion is not supported: {}", list_name)
            }
            None => warn!("Ignoring malformed list name '{}'", list_name),
        }
    }

    pub fn stats(&self) -> VariableStats {
        VariableStats {
            cached: self.globals.cached(),
            stored: self.globals.stored().ok(),
            scopes: self.scopes.len(),
        }
    }
}

/// Owned scope that is destroyed on drop, on every exit path.
pub struct ScopeGuard {
    id: ScopeId,
    manager: Arc<VariableManager>,
}

impl ScopeGuard {
    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn variables(&self) -> &Arc<VariableManager> {
        &self.manager
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard").field("id", &self.id).finish()
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        self.manager.destroy_scope(self.id);
    }
}
