//! Boolean predicates for `if` blocks.
//!
//! Forms are tried in a fixed order and the first match wins, so
//! `{x} is not set` is never read as an equality. Matching is
//! case-insensitive and must cover the whole text.
//!
//! Text that matches no form compiles to [`Condition::Unrecognized`], which
//! evaluates to `true`. Evaluation never fails: absent operands and
//! non-numeric comparisons yield `false`.

use lazy_static::lazy_static;
use regex::Regex;

use super::context::ExecutionContext;
use super::expression::Expression;
use super::placeholder::resolve_variable_name;

lazy_static! {
    static ref IS_SET: Regex = Regex::new(r"(?i)^(.+?)\s+is\s+set$").unwrap();
    static ref IS_NOT_SET: Regex = Regex::new(r"(?i)^(.+?)\s+is\s+not\s+set$").unwrap();
    static ref IN_SERVER: Regex =
        Regex::new(r#"(?i)^(.+?)\s+is\s+in\s+server\s+"([^"]+)"$"#).unwrap();
    static ref NOT_IN_SERVER: Regex =
        Regex::new(r#"(?i)^(.+?)\s+is\s+not\s+in\s+server\s+"([^"]+)"$"#).unwrap();
    static ref CONTAINS: Regex = Regex::new(r"(?i)^(.+?)\s+contains\s+(.+)$").unwrap();
    static ref NOT_EQUALS: Regex = Regex::new(r"(?i)^(.+?)\s+(?:is\s+not|!=)\s+(.+)$").unwrap();
    static ref EQUALS: Regex = Regex::new(r"(?i)^(.+?)\s+(?:is|==|=)\s+(.+)$").unwrap();
    static ref GREATER_THAN: Regex = Regex::new(r"^(.+?)\s+>\s+(.+)$").unwrap();
    static ref LESS_THAN: Regex = Regex::new(r"^(.+?)\s+<\s+(.+)$").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Comparison {
    #[strum(serialize = "contains")]
    Contains,
    #[strum(serialize = "!=")]
    NotEquals,
    #[strum(serialize = "==")]
    Equals,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = "<")]
    LessThan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Bracketed variable name, placeholders unresolved
    IsSet(String),
    IsNotSet(String),
    InServer { subject: String, server: String },
    NotInServer { subject: String, server: String },
    Compare {
        left: Expression,
        op: Comparison,
        right: Expression,
    },
    /// Fail-open fallback carrying the source text
    Unrecognized(String),
}

impl Condition {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();

        if let Some(caps) = IS_SET.captures(text) {
            return Self::IsSet(caps[1].trim().to_string());
        }
        if let Some(caps) = IS_NOT_SET.captures(text) {
            return Self::IsNotSet(caps[1].trim().to_string());
        }
        if let Some(caps) = IN_SERVER.captures(text) {
            return Self::InServer {
                subject: caps[1].trim().to_string(),
                server: caps[2].trim().to_string(),
            };
        }
        if let Some(caps) = NOT_IN_SERVER.captures(text) {
            return Self::NotInServer {
                subject: caps[1].trim().to_string(),
                server: caps[2].trim().to_string(),
            };
        }

        let binary = [
            (&*CONTAINS, Comparison::Contains),
            (&*NOT_EQUALS, Comparison::NotEquals),
            (&*EQUALS, Comparison::Equals),
            (&*GREATER_THAN, Comparison::GreaterThan),
            (&*LESS_THAN, Comparison::LessThan),
        ];
        for (pattern, op) in binary {
            if let Some(caps) = pattern.captures(text) {
                return Self::Compare {
                    left: Expression::parse(&caps[1]),
                    op,
                    right: Expression::parse(&caps[2]),
                };
            }
        }

        Self::Unrecognized(text.to_string())
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }

    pub fn evaluate(&self, ctx: &ExecutionContext) -> bool {
        match self {
            Self::IsSet(name) => ctx
                .is_variable_set(&resolve_variable_name(name, ctx))
                .unwrap_or(false),
            Self::IsNotSet(name) => ctx
                .is_variable_set(&resolve_variable_name(name, ctx))
                .map(|set| !set)
                .unwrap_or(true),
            Self::InServer { subject, server } => in_server(subject, server, ctx),
            Self::NotInServer { subject, server } => !in_server(subject, server, ctx),
            Self::Compare { left, op, right } => {
                compare(left.evaluate(ctx), *op, right.evaluate(ctx))
            }
            Self::Unrecognized(_) => true,
        }
    }
}

fn in_server(subject: &str, server: &str, ctx: &ExecutionContext) -> bool {
    if subject != "player" {
        return false;
    }
    ctx.session_destination()
        .is_some_and(|current| current.eq_ignore_ascii_case(server))
}

fn compare(left: Option<String>, op: Comparison, right: Option<String>) -> bool {
    match op {
        Comparison::Equals => left == right,
        Comparison::NotEquals => left != right,
        Comparison::Contains => match (left, right) {
            (Some(l), Some(r)) => l.contains(&r),
            _ => false,
        },
        Comparison::GreaterThan | Comparison::LessThan => {
            let (Some(l), Some(r)) = (number(left), number(right)) else {
                return false;
            };
            if op == Comparison::GreaterThan {
                l > r
            } else {
                l < r
            }
        }
    }
}

/// Only finite decimals count; `inf` and `NaN` are text.
fn number(value: Option<String>) -> Option<f64> {
    value?
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}
