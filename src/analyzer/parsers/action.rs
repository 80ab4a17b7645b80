//! Leaf action lines.

use lazy_static::lazy_static;
use regex::Regex;

use crate::analyzer::core::ParseErrorKind;
use crate::ast::{
    Action, Broadcast, DeleteVariable, MessageTarget, SendMessage, SetVariable, TransferSession,
};

lazy_static! {
    static ref SEND: Regex = Regex::new(r#"^send\s+"([^"]+)"(?:\s+to\s+(.+))?$"#).unwrap();
    static ref TRANSFER: Regex = Regex::new(r#"^transfer\s+(.+?)\s+to\s+"([^"]+)"$"#).unwrap();
    static ref SET: Regex = Regex::new(r"^set\s+(\{(?:[^{}]|\{[^{}]+\})+\})\s+to\s+(.+)$").unwrap();
    static ref DELETE: Regex = Regex::new(r"^delete\s+(\{(?:[^{}]|\{[^{}]+\})+\})$").unwrap();
    static ref SERVER_MEMBERS: Regex =
        Regex::new(r#"^all\s+players\s+in\s+server\s+"([^"]+)"$"#).unwrap();
}

const ALL_PLAYERS_IN_SERVER: &str = "all players in server";

/// Parse one trimmed, non-conditional action line.
pub fn parse_action(text: &str) -> Result<Action, (ParseErrorKind, String)> {
    if let Some(caps) = SEND.captures(text) {
        let message = caps[1].to_string();
        return match caps.get(2).map(|m| m.as_str().trim()) {
            None | Some("player") => Ok(send(message, MessageTarget::Invoker)),
            Some("all players") => Ok(send(message, MessageTarget::Everyone)),
            Some(target) if target.starts_with(ALL_PLAYERS_IN_SERVER) => {
                match SERVER_MEMBERS.captures(target) {
                    Some(server) => Ok(Action::BroadcastToDestinationMembers(Broadcast {
                        message,
                        destination: server[1].to_string(),
                    })),
                    None => Err((
                        ParseErrorKind::InvalidTarget,
                        format!(
                            "Expected {} \"<name>\", found: {}",
                            ALL_PLAYERS_IN_SERVER, target
                        ),
                    )),
                }
            }
            Some(target) => Ok(send(message, MessageTarget::Named(target.to_string()))),
        };
    }

    if let Some(caps) = TRANSFER.captures(text) {
        return Ok(Action::TransferSession(TransferSession {
            target: caps[1].trim().to_string(),
            destination: caps[2].trim().to_string(),
        }));
    }

    if let Some(caps) = SET.captures(text) {
        let value = caps[2].trim();
        let value = value
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(value);
        return Ok(Action::SetVariable(SetVariable {
            name: caps[1].to_string(),
            value: value.to_string(),
        }));
    }

    if let Some(caps) = DELETE.captures(text) {
        return Ok(Action::DeleteVariable(DeleteVariable {
            name: caps[1].to_string(),
        }));
    }

    Err((
        ParseErrorKind::SyntaxError,
        "Unrecognized action syntax".to_string(),
    ))
}

fn send(message: String, target: MessageTarget) -> Action {
    Action::SendMessage(SendMessage { message, target })
}
