//! Single-term expressions.
//!
//! An [`Expression`] is parsed once and evaluated per invocation. Parsing
//! never looks at a context; evaluation never mutates one.
//!
//! | source                 | meaning                                  |
//! |------------------------|------------------------------------------|
//! | `"text"`               | literal `text`                           |
//! | `{name}`               | variable, `%..%` inside resolved first   |
//! | `player`               | acting session name                      |
//! | `player's name`        | acting session name                      |
//! | `player's uuid`        | acting session id                        |
//! | `player's server`      | acting session destination               |
//! | `%key%`                | placeholder (event data, argument, ...)  |
//! | anything else          | the text itself                          |

use lazy_static::lazy_static;
use regex::Regex;

use super::context::ExecutionContext;
use super::placeholder::{resolve_variable_name, substitute};

lazy_static! {
    static ref QUOTED: Regex = Regex::new(r#"^"(.*)"$"#).unwrap();
    static ref VARIABLE: Regex = Regex::new(r"^\{(?:[^{}]|\{[^{}]+\})+\}$").unwrap();
}

/// Attribute of the acting session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum SessionAttribute {
    Name,
    Uuid,
    Server,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Quoted text, quotes removed
    Literal(String),
    /// Bracketed variable reference
    Variable(String),
    Session(SessionAttribute),
    /// `%key%`, key without the percent signs
    Placeholder(String),
    /// Unquoted text taken as is
    Plain(String),
}

impl Expression {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Some(caps) = QUOTED.captures(text) {
            return Self::Literal(caps[1].to_string());
        }
        if VARIABLE.is_match(text) {
            return Self::Variable(text.to_string());
        }
        match text {
            "player" | "player's name" => return Self::Session(SessionAttribute::Name),
            "player's uuid" => return Self::Session(SessionAttribute::Uuid),
            "player's server" => return Self::Session(SessionAttribute::Server),
            _ => {}
        }
        if let Some(key) = text
            .strip_prefix('%')
            .and_then(|t| t.strip_suffix('%'))
            .filter(|key| !key.is_empty())
        {
            return Self::Placeholder(key.to_string());
        }
        Self::Plain(text.to_string())
    }

    /// Value under `ctx`, `None` when absent.
    pub fn evaluate(&self, ctx: &ExecutionContext) -> Option<String> {
        match self {
            Self::Literal(value) | Self::Plain(value) => Some(value.clone()),
            Self::Variable(name) => ctx.get_variable(&resolve_variable_name(name, ctx)),
            Self::Session(attribute) => {
                let session = ctx.session()?;
                match attribute {
                    SessionAttribute::Name => Some(session.name()),
                    SessionAttribute::Uuid => Some(session.unique_id().to_string()),
                    SessionAttribute::Server => session.current_destination(),
                }
            }
            Self::Placeholder(key) => ctx.placeholder(key),
        }
    }
}

/// Substitute every placeholder in a message body or value.
///
/// Session braces, `%key%` tokens and variable braces are all replaced in a
/// single left-to-right pass. An unset variable keeps its bracket text.
pub fn evaluate_with_replacements(text: &str, ctx: &ExecutionContext) -> String {
    substitute(text, ctx)
}
