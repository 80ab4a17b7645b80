//! Parsed script model.
//!
//! A [`Script`] is immutable once parsed and is replaced wholesale on reload.
//! Leaf actions keep their text exactly as written, placeholders included;
//! only conditions are compiled at parse time.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::eval::condition::Condition;

/// One parsed source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    /// Source file identifier
    pub name: String,
    pub commands: Vec<CommandDef>,
    pub events: Vec<EventTrigger>,
}

impl Script {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn command(&self, name: &str) -> Option<&CommandDef> {
        self.commands
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn triggers(&self, kind: EventKind) -> impl Iterator<Item = &EventTrigger> {
        self.events.iter().filter(move |e| e.kind == kind)
    }
}

/// `command /name <arg> ...:` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandDef {
    pub name: String,
    /// Declared argument names, in order
    pub arguments: Vec<String>,
    pub actions: Vec<Action>,
    pub permission: Option<String>,
    pub permission_message: Option<String>,
    pub aliases: Vec<String>,
    pub usage: Option<String>,
    pub description: Option<String>,
}

impl CommandDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// `usage:` metadata, or `/name <a> <b>` built from the declared arguments.
    pub fn usage_or_default(&self) -> String {
        match &self.usage {
            Some(usage) if !usage.is_empty() => usage.clone(),
            _ => {
                let mut usage = format!("/{}", self.name);
                for arg in &self.arguments {
                    usage.push_str(&format!(" <{}>", arg));
                }
                usage
            }
        }
    }
}

/// Proxy lifecycle events a script can react to.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(ascii_case_insensitive)]
pub enum EventKind {
    #[strum(serialize = "join")]
    Join,
    #[strum(serialize = "quit")]
    Quit,
    #[strum(serialize = "server switch")]
    ServerSwitch,
    #[strum(serialize = "chat")]
    Chat,
    #[strum(serialize = "server connect")]
    ServerConnect,
}

/// `on <event>:` block.
#[derive(Debug, Clone, PartialEq)]
pub struct EventTrigger {
    pub kind: EventKind,
    /// Name of the owning script
    pub script_name: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SendMessage(SendMessage),
    TransferSession(TransferSession),
    BroadcastToDestinationMembers(Broadcast),
    SetVariable(SetVariable),
    DeleteVariable(DeleteVariable),
    Conditional(Conditional),
}

impl Action {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Action::SendMessage(_) => "send",
            Action::TransferSession(_) => "transfer",
            Action::BroadcastToDestinationMembers(_) => "broadcast",
            Action::SetVariable(_) => "set",
            Action::DeleteVariable(_) => "delete",
            Action::Conditional(_) => "if",
        }
    }
}

/// Recipient of a [`SendMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTarget {
    /// The session that triggered the invocation
    Invoker,
    /// Every connected session
    Everyone,
    /// A session resolved by name after substitution
    Named(String),
    /// Members of a destination. Only valid on [`Broadcast`].
    DestinationMembers,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendMessage {
    pub message: String,
    pub target: MessageTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferSession {
    /// `player` or a session name expression
    pub target: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Broadcast {
    pub message: String,
    pub destination: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetVariable {
    /// Bracketed name, placeholders unresolved
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteVariable {
    pub name: String,
}

/// `if` with its two branches. An `else if` chain is an `if` nested alone in
/// the else branch.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Condition,
    pub if_branch: Vec<Action>,
    pub else_branch: Vec<Action>,
}
