use std::collections::HashMap;
use std::sync::Arc;

use crate::provider::capabilities::host::Session;
use crate::variable::{ScopeGuard, ScopeId, VariableManager};

/// Run-time state of one invocation.
///
/// A context owns the [`ScopeGuard`] of its transient variables, so dropping
/// the context releases the scope whether the actions completed or not.
#[derive(Default)]
pub struct ExecutionContext {
    session: Option<Arc<dyn Session>>,
    argument_names: Vec<String>,
    argument_values: Vec<String>,
    event_data: HashMap<String, String>,
    scope: Option<ScopeGuard>,
}

impl ExecutionContext {
    /// Context with a fresh scope in `variables`.
    pub fn new(variables: &Arc<VariableManager>) -> Self {
        Self {
            scope: Some(variables.scoped()),
            ..Default::default()
        }
    }

    pub fn with_session(mut self, session: Arc<dyn Session>) -> Self {
        self.session = Some(session);
        self
    }

    /// Pair declared argument names with the values supplied.
    ///
    /// Extra values stay reachable as `%arg-N%`; missing values leave the
    /// name unbound.
    pub fn with_arguments(mut self, names: &[String], values: &[String]) -> Self {
        self.argument_names = names.to_vec();
        self.argument_values = values.to_vec();
        self
    }

    pub fn with_event_data(mut self, event_data: HashMap<String, String>) -> Self {
        self.event_data = event_data;
        self
    }

    pub fn session(&self) -> Option<&Arc<dyn Session>> {
        self.session.as_ref()
    }

    pub fn session_name(&self) -> Option<String> {
        self.session.as_ref().map(|s| s.name())
    }

    pub fn session_destination(&self) -> Option<String> {
        self.session.as_ref()?.current_destination()
    }

    /// Value of a declared argument.
    pub fn argument(&self, name: &str) -> Option<&str> {
        let index = self.argument_names.iter().position(|n| n == name)?;
        self.argument_values.get(index).map(String::as_str)
    }

    /// Value at a 1-based position.
    pub fn positional(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.argument_values.get(i))
            .map(String::as_str)
    }

    pub fn event_value(&self, key: &str) -> Option<&str> {
        self.event_data.get(key).map(String::as_str)
    }

    pub fn event_data(&self) -> &HashMap<String, String> {
        &self.event_data
    }

    pub fn scope_id(&self) -> Option<ScopeId> {
        self.scope.as_ref().map(ScopeGuard::id)
    }

    pub fn variables(&self) -> Option<&Arc<VariableManager>> {
        self.scope.as_ref().map(ScopeGuard::variables)
    }

    /// Resolve a `%key%` placeholder key.
    ///
    /// Lookup order: session (`player`, `uuid`), event data, declared
    /// arguments, then `arg-N`.
    pub fn placeholder(&self, key: &str) -> Option<String> {
        if let Some(session) = &self.session {
            match key {
                "player" => return Some(session.name()),
                "uuid" => return Some(session.unique_id().to_string()),
                _ => {}
            }
        }
        if let Some(value) = self.event_value(key) {
            return Some(value.to_string());
        }
        if let Some(value) = self.argument(key) {
            return Some(value.to_string());
        }
        key.strip_prefix("arg-")
            .and_then(|n| n.parse::<usize>().ok())
            .and_then(|n| self.positional(n))
            .map(str::to_string)
    }

    /// Read a variable through this context's scope.
    pub fn get_variable(&self, name: &str) -> Option<String> {
        let scope = self.scope.as_ref()?;
        scope.variables().get(scope.id(), name)
    }

    /// `None` when the context has no variables attached.
    pub fn is_variable_set(&self, name: &str) -> Option<bool> {
        let scope = self.scope.as_ref()?;
        Some(scope.variables().is_set(scope.id(), name))
    }

    /// Write a variable through this context's scope. Returns `false` when
    /// the context has no variables attached.
    pub fn set_variable(&self, name: &str, value: &str) -> bool {
        match &self.scope {
            Some(scope) => {
                scope.variables().set(scope.id(), name, value);
                true
            }
            None => false,
        }
    }

    pub fn delete_variable(&self, name: &str) -> bool {
        match &self.scope {
            Some(scope) => {
                scope.variables().delete(scope.id(), name);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("session", &self.session_name())
            .field("argument_names", &self.argument_names)
            .field("argument_values", &self.argument_values)
            .field("event_data", &self.event_data)
            .field("scope", &self.scope_id())
            .finish()
    }
}
