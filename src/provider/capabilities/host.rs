//! Host capabilities consumed by the scripting core.
//!
//! The proxy that embeds this crate implements these traits. The core never
//! talks to the network itself: every observable effect of a script goes
//! through a [`Session`] or is resolved via the [`ProxyHost`] directories.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

/// A connected session (a player on the proxy).
pub trait Session: Send + Sync {
    /// Display name, unique among connected sessions.
    fn name(&self) -> String;

    /// Stable unique id.
    fn unique_id(&self) -> Uuid;

    /// Name of the destination the session is currently routed to.
    fn current_destination(&self) -> Option<String>;

    /// Deliver an already formatted message.
    fn send_message(&self, message: &str) -> Result<(), HostError>;

    /// Request a transfer to `destination`. Fire-and-forget: `Ok` only means
    /// the request was issued.
    fn transfer(&self, destination: &dyn Destination) -> Result<(), HostError>;

    /// Whether the session holds `permission`.
    fn has_permission(&self, permission: &str) -> bool;
}

/// A named routing target a session can be transferred to.
pub trait Destination: Send + Sync {
    fn name(&self) -> String;
}

/// Session and destination directories of the host proxy.
pub trait ProxyHost: Send + Sync {
    /// Resolve a connected session by display name.
    fn session(&self, name: &str) -> Option<Arc<dyn Session>>;

    /// Every currently connected session.
    fn sessions(&self) -> Vec<Arc<dyn Session>>;

    /// Resolve a destination by name.
    fn destination(&self, name: &str) -> Option<Arc<dyn Destination>>;
}

/// Failures reported by host capabilities.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Session disconnected: {0}")]
    Disconnected(String),

    #[error("Message delivery failed: {0}")]
    Delivery(String),

    #[error("Transfer rejected: {0}")]
    TransferRejected(String),
}
