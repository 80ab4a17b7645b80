use std::fmt;

/// Routing of a bracketed variable name.
///
/// `{name}` addresses the durable global namespace, `{_name}` the transient
/// scope of the current invocation. The payload is the key inside the
/// brackets, without the `_` marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VariableAccess {
    Global(String),
    Local(String),
}

impl VariableAccess {
    /// Parse a bracketed name. Empty or malformed brackets yield `None`.
    pub fn parse(bracket_name: &str) -> Option<Self> {
        let inner = bracket_name
            .trim()
            .strip_prefix('{')?
            .strip_suffix('}')?;
        if inner.is_empty() || inner.contains(['{', '}']) {
            return None;
        }
        match inner.strip_prefix('_') {
            Some("") => None,
            Some(local) => Some(Self::Local(local.to_string())),
            None => Some(Self::Global(inner.to_string())),
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Self::Global(key) | Self::Local(key) => key,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local(_))
    }
}

impl fmt::Display for VariableAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global(key) => write!(f, "{{{}}}", key),
            Self::Local(key) => write!(f, "{{_{}}}", key),
        }
    }
}

/// Key prefix addressed by a list name such as `{coins::*}` or `{coins}`.
///
/// Returns the access kind together with the prefix including the trailing
/// `::` separator.
pub fn list_prefix(list_name: &str) -> Option<VariableAccess> {
    let access = VariableAccess::parse(list_name)?;
    let base = access.key().strip_suffix("::*").unwrap_or(access.key());
    if base.is_empty() {
        return None;
    }
    let prefix = format!("{}::", base);
    Some(match access {
        VariableAccess::Global(_) => VariableAccess::Global(prefix),
        VariableAccess::Local(_) => VariableAccess::Local(prefix),
    })
}
