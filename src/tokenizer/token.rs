use lazy_static::lazy_static;
use regex::Regex;
use strum::{Display, EnumString};

lazy_static! {
    static ref COMMAND: Regex = Regex::new(r"^command\s+/(\S+?)(?:\s+(.*?))?\s*:$").unwrap();
    static ref EVENT: Regex = Regex::new(r"^on\s+(.+?)\s*:$").unwrap();
    static ref METADATA: Regex =
        Regex::new(r"^(permission message|permission|aliases|usage|description):\s*(.*)$")
            .unwrap();
    static ref ELSE_IF: Regex = Regex::new(r"^else\s+if\s+(.+):$").unwrap();
    static ref IF: Regex = Regex::new(r"^if\s+(.+):$").unwrap();
}

/// Command metadata keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum MetadataKey {
    #[strum(serialize = "permission")]
    Permission,
    #[strum(serialize = "permission message")]
    PermissionMessage,
    #[strum(serialize = "aliases")]
    Aliases,
    #[strum(serialize = "usage")]
    Usage,
    #[strum(serialize = "description")]
    Description,
}

/// What a single script line is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineToken {
    /// `command /name <a> <b>:`, name and argument section unvalidated
    Command { name: String, arguments: String },
    /// `on <event>:`, event name unvalidated
    Event(String),
    Metadata { key: MetadataKey, value: String },
    Trigger,
    If(String),
    ElseIf(String),
    Else,
    /// Anything else, expected to be an action
    Statement(String),
}

impl LineToken {
    /// Classify a trimmed, non-empty line.
    pub fn classify(text: &str) -> Self {
        if let Some(caps) = COMMAND.captures(text) {
            return Self::Command {
                name: caps[1].to_string(),
                arguments: caps
                    .get(2)
                    .map(|m| m.as_str().trim().to_string())
                    .unwrap_or_default(),
            };
        }
        if let Some(caps) = EVENT.captures(text) {
            return Self::Event(caps[1].to_string());
        }
        if text == "trigger:" {
            return Self::Trigger;
        }
        if let Some(caps) = METADATA.captures(text) {
            if let Ok(key) = caps[1].parse::<MetadataKey>() {
                return Self::Metadata {
                    key,
                    value: caps[2].trim().to_string(),
                };
            }
        }
        if text == "else:" {
            return Self::Else;
        }
        if let Some(caps) = ELSE_IF.captures(text) {
            return Self::ElseIf(caps[1].trim().to_string());
        }
        if let Some(caps) = IF.captures(text) {
            return Self::If(caps[1].trim().to_string());
        }
        Self::Statement(text.to_string())
    }

    /// Whether this line opens a top-level block.
    pub fn is_header(&self) -> bool {
        matches!(self, Self::Command { .. } | Self::Event(_))
    }
}

/// One meaningful line of script source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 1-based line number in the source
    pub number: usize,
    /// Line as written, without the line terminator
    pub raw: String,
    /// Indentation width in columns
    pub width: usize,
    pub token: LineToken,
}

impl SourceLine {
    pub fn text(&self) -> &str {
        self.raw.trim()
    }
}
