//! Proxy lifecycle events and the data they expose to scripts.
//!
//! Every event carries `player` and `uuid` for the session it concerns. The
//! remaining keys depend on the kind:
//!
//! | kind             | keys                                 |
//! |------------------|--------------------------------------|
//! | `join`           |                                      |
//! | `quit`           | `quit-message` (always empty)        |
//! | `server switch`  | `from-server`, `to-server`           |
//! | `chat`           | `message`                            |
//! | `server connect` | `target-server`                      |

use std::collections::HashMap;

use crate::ast::EventKind;
use crate::provider::capabilities::host::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Join,
    Quit,
    /// `from` is `None` on the first connection after login
    ServerSwitch {
        from: Option<String>,
        to: Option<String>,
    },
    Chat {
        message: String,
    },
    /// Fired before the connection is made
    ServerConnect {
        target: Option<String>,
    },
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Join => EventKind::Join,
            HostEvent::Quit => EventKind::Quit,
            HostEvent::ServerSwitch { .. } => EventKind::ServerSwitch,
            HostEvent::Chat { .. } => EventKind::Chat,
            HostEvent::ServerConnect { .. } => EventKind::ServerConnect,
        }
    }

    /// Key/value pairs reachable as `%key%` from the event's triggers.
    pub fn event_data(&self, session: &dyn Session) -> HashMap<String, String> {
        let mut data = HashMap::from([
            ("player".to_string(), session.name()),
            ("uuid".to_string(), session.unique_id().to_string()),
        ]);
        match self {
            HostEvent::Join => {}
            HostEvent::Quit => {
                data.insert("quit-message".to_string(), String::new());
            }
            HostEvent::ServerSwitch { from, to } => {
                data.insert(
                    "from-server".to_string(),
                    from.clone().unwrap_or_else(|| "none".to_string()),
                );
                data.insert(
                    "to-server".to_string(),
                    to.clone().unwrap_or_else(|| "unknown".to_string()),
                );
            }
            HostEvent::Chat { message } => {
                data.insert("message".to_string(), message.clone());
            }
            HostEvent::ServerConnect { target } => {
                data.insert(
                    "target-server".to_string(),
                    target.clone().unwrap_or_else(|| "unknown".to_string()),
                );
            }
        }
        data
    }
}
