//! In-memory proxy host.
//!
//! Sessions record every message and transfer they receive, which makes this
//! host the harness for the CLI `run` command and for the integration tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use dashmap::DashMap;
use uuid::Uuid;

use crate::provider::capabilities::host::{Destination, HostError, ProxyHost, Session};

/// Named destination with no behaviour of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryDestination {
    name: String,
}

impl InMemoryDestination {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Destination for InMemoryDestination {
    fn name(&self) -> String {
        self.name.clone()
    }
}

/// Session that records what scripts do to it.
#[derive(Debug)]
pub struct InMemorySession {
    name: String,
    id: Uuid,
    destination: RwLock<Option<String>>,
    permissions: RwLock<HashSet<String>>,
    all_permissions: AtomicBool,
    connected: AtomicBool,
    inbox: Mutex<Vec<String>>,
    transfers: Mutex<Vec<String>>,
}

impl InMemorySession {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: Uuid::new_v4(),
            destination: RwLock::new(None),
            permissions: RwLock::new(HashSet::new()),
            all_permissions: AtomicBool::new(false),
            connected: AtomicBool::new(true),
            inbox: Mutex::new(Vec::new()),
            transfers: Mutex::new(Vec::new()),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = id;
        self
    }

    pub fn with_destination(self, destination: impl Into<String>) -> Self {
        self.set_destination(Some(destination.into()));
        self
    }

    pub fn with_permission(self, permission: impl Into<String>) -> Self {
        self.grant(permission);
        self
    }

    /// Grant every permission.
    pub fn operator(self) -> Self {
        self.all_permissions.store(true, Ordering::SeqCst);
        self
    }

    pub fn grant(&self, permission: impl Into<String>) {
        if let Ok(mut perms) = self.permissions.write() {
            perms.insert(permission.into());
        }
    }

    pub fn set_destination(&self, destination: Option<String>) {
        if let Ok(mut current) = self.destination.write() {
            *current = destination;
        }
    }

    /// Subsequent deliveries fail with [`HostError::Disconnected`].
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Messages delivered so far, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.inbox.lock().map(|m| m.clone()).unwrap_or_default()
    }

    /// Destinations this session was transferred to, oldest first.
    pub fn transfers(&self) -> Vec<String> {
        self.transfers.lock().map(|t| t.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut inbox) = self.inbox.lock() {
            inbox.clear();
        }
        if let Ok(mut transfers) = self.transfers.lock() {
            transfers.clear();
        }
    }

    fn ensure_connected(&self) -> Result<(), HostError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(HostError::Disconnected(self.name.clone()))
        }
    }
}

impl Session for InMemorySession {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn unique_id(&self) -> Uuid {
        self.id
    }

    fn current_destination(&self) -> Option<String> {
        self.destination.read().ok().and_then(|d| d.clone())
    }

    fn send_message(&self, message: &str) -> Result<(), HostError> {
        self.ensure_connected()?;
        self.inbox
            .lock()
            .map_err(|_| HostError::Delivery(self.name.clone()))?
            .push(message.to_string());
        Ok(())
    }

    fn transfer(&self, destination: &dyn Destination) -> Result<(), HostError> {
        self.ensure_connected()?;
        let name = destination.name();
        self.transfers
            .lock()
            .map_err(|_| HostError::TransferRejected(name.clone()))?
            .push(name.clone());
        self.set_destination(Some(name));
        Ok(())
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.all_permissions.load(Ordering::SeqCst)
            || self
                .permissions
                .read()
                .map(|p| p.contains(permission))
                .unwrap_or(false)
    }
}

/// Proxy with registries of in-memory sessions and destinations.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProxy {
    sessions: Arc<DashMap<String, Arc<InMemorySession>>>,
    destinations: Arc<DashMap<String, Arc<InMemoryDestination>>>,
}

impl InMemoryProxy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect a session, replacing any session with the same name.
    pub fn connect(&self, session: InMemorySession) -> Arc<InMemorySession> {
        let session = Arc::new(session);
        self.sessions
            .insert(session.name.clone(), Arc::clone(&session));
        session
    }

    pub fn disconnect(&self, name: &str) -> Option<Arc<InMemorySession>> {
        self.sessions.remove(name).map(|(_, s)| {
            s.disconnect();
            s
        })
    }

    pub fn add_destination(&self, name: impl Into<String>) {
        let destination = InMemoryDestination::new(name);
        self.destinations
            .insert(destination.name.clone(), Arc::new(destination));
    }

    /// Typed handle to a connected session.
    pub fn player(&self, name: &str) -> Option<Arc<InMemorySession>> {
        self.sessions.get(name).map(|s| Arc::clone(s.value()))
    }
}

impl ProxyHost for InMemoryProxy {
    fn session(&self, name: &str) -> Option<Arc<dyn Session>> {
        self.player(name).map(|s| s as Arc<dyn Session>)
    }

    fn sessions(&self) -> Vec<Arc<dyn Session>> {
        let mut sessions: Vec<Arc<InMemorySession>> =
            self.sessions.iter().map(|s| Arc::clone(s.value())).collect();
        sessions.sort_by(|a, b| a.name.cmp(&b.name));
        sessions
            .into_iter()
            .map(|s| s as Arc<dyn Session>)
            .collect()
    }

    fn destination(&self, name: &str) -> Option<Arc<dyn Destination>> {
        self.destinations
            .get(name)
            .map(|d| Arc::clone(d.value()) as Arc<dyn Destination>)
    }
}
