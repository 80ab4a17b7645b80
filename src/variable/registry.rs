use std::collections::HashMap;
use std::fmt;

use dashmap::DashMap;
use uuid::Uuid;

/// Identifier of one invocation's transient variable map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(Uuid);

impl ScopeId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transient variable maps keyed by scope.
///
/// Writes to an unknown or destroyed scope are silently dropped.
#[derive(Debug, Default)]
pub struct ScopeRegistry {
    scopes: DashMap<ScopeId, HashMap<String, String>>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self) -> ScopeId {
        let id = ScopeId::new();
        self.scopes.insert(id, HashMap::new());
        id
    }

    pub fn destroy(&self, id: ScopeId) -> bool {
        self.scopes.remove(&id).is_some()
    }

    pub fn set(&self, id: ScopeId, key: &str, value: &str) {
        if let Some(mut scope) = self.scopes.get_mut(&id) {
            scope.insert(key.to_string(), value.to_string());
        }
    }

    pub fn get(&self, id: ScopeId, key: &str) -> Option<String> {
        self.scopes.get(&id)?.get(key).cloned()
    }

    pub fn contains(&self, id: ScopeId, key: &str) -> bool {
        self.scopes
            .get(&id)
            .is_some_and(|scope| scope.contains_key(key))
    }

    pub fn delete(&self, id: ScopeId, key: &str) {
        if let Some(mut scope) = self.scopes.get_mut(&id) {
            scope.remove(key);
        }
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scopes_are_isolated() {
        let registry = ScopeRegistry::new();
        let a = registry.create();
        let b = registry.create();

        registry.set(a, "x", "1");
        assert_eq!(registry.get(a, "x").as_deref(), Some("1"));
        assert_eq!(registry.get(b, "x"), None);
        assert!(!registry.contains(b, "x"));
    }

    #[test]
    fn test_destroy_reclaims_entries() {
        let registry = ScopeRegistry::new();
        let id = registry.create();
        registry.set(id, "x", "1");
        assert_eq!(registry.len(), 1);

        assert!(registry.destroy(id));
        assert!(!registry.destroy(id));
        assert!(registry.is_empty());

        // writes to a destroyed scope are dropped
        registry.set(id, "x", "2");
        assert_eq!(registry.get(id, "x"), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_delete() {
        let registry = ScopeRegistry::new();
        let id = registry.create();
        registry.set(id, "x", "1");
        registry.delete(id, "x");
        registry.delete(id, "missing");
        assert!(!registry.contains(id, "x"));
    }
}
