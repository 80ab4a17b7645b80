//! Placeholder substitution.
//!
//! Two token forms are recognised in running text:
//!
//! * `%key%` resolved through [`ExecutionContext::placeholder`]
//! * `{...}` resolved as a session attribute (`{player}`, `{player's name}`,
//!   `{player's uuid}`, `{player's server}`) or as a variable reference
//!
//! Text is scanned once from left to right. A substituted value is copied to
//! the output as is and never scanned again, so values coming from players
//! cannot smuggle in further placeholders. Unknown `%` tokens are kept
//! verbatim; unset variables keep their (name-resolved) bracket text.

use super::context::ExecutionContext;

/// Resolve `%key%` tokens only. Used for variable names, where other
/// variables must not be expanded.
pub fn resolve_name_placeholders(text: &str, ctx: &ExecutionContext) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        rest = push_percent(&rest[start + 1..], ctx, &mut out);
    }
    out.push_str(rest);
    out
}

/// Whole-text substitution used for message bodies and values.
pub fn substitute(text: &str, ctx: &ExecutionContext) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(['%', '{']) {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        rest = if rest[start..].starts_with('%') {
            push_percent(after, ctx, &mut out)
        } else {
            push_brace(after, ctx, &mut out)
        };
    }
    out.push_str(rest);
    out
}

/// `after` follows an opening `%`. Returns the unconsumed remainder.
fn push_percent<'a>(after: &'a str, ctx: &ExecutionContext, out: &mut String) -> &'a str {
    if let Some(end) = after.find('%') {
        if let Some(value) = ctx.placeholder(&after[..end]) {
            out.push_str(&value);
            return &after[end + 1..];
        }
    }
    out.push('%');
    after
}

/// Resolve a whole `{...}` variable name before lookup: `%key%` tokens and
/// nested session braces, so `{coins::{player}}` names `{coins::Alice}`.
/// Other variables are never expanded.
pub fn resolve_variable_name(name: &str, ctx: &ExecutionContext) -> String {
    match name.strip_prefix('{').and_then(|after| variable_span(after, ctx)) {
        Some((inner, _, "")) => format!("{{{}}}", inner),
        _ => resolve_name_placeholders(name, ctx),
    }
}

/// `after` follows an opening `{`. Returns the resolved inner name, whether
/// it nested session braces, and the remainder after the closing `}`.
/// Nested values are inserted as is.
fn variable_span<'a>(after: &'a str, ctx: &ExecutionContext) -> Option<(String, bool, &'a str)> {
    let mut name = String::new();
    let mut nested = false;
    let mut rest = after;
    loop {
        let at = rest.find(['{', '}'])?;
        name.push_str(&resolve_name_placeholders(&rest[..at], ctx));
        if rest[at..].starts_with('}') {
            rest = &rest[at + 1..];
            break;
        }
        let inner = &rest[at + 1..];
        let end = inner.find(['{', '}']).filter(|&end| inner[end..].starts_with('}'))?;
        name.push_str(&session_attribute(&inner[..end], ctx)?);
        nested = true;
        rest = &inner[end + 1..];
    }
    (!name.is_empty()).then_some((name, nested, rest))
}

/// `after` follows an opening `{`. Returns the unconsumed remainder.
fn push_brace<'a>(after: &'a str, ctx: &ExecutionContext, out: &mut String) -> &'a str {
    let Some((name, nested, rest)) = variable_span(after, ctx) else {
        out.push('{');
        return after;
    };
    if !nested {
        let raw = &after[..after.len() - rest.len() - 1];
        if let Some(value) = session_attribute(raw, ctx) {
            out.push_str(&value);
            return rest;
        }
    }
    let name = format!("{{{}}}", name);
    match ctx.get_variable(&name) {
        Some(value) => out.push_str(&value),
        None => out.push_str(&name),
    }
    rest
}

fn session_attribute(inner: &str, ctx: &ExecutionContext) -> Option<String> {
    let session = ctx.session()?;
    match inner {
        "player" | "player's name" => Some(session.name()),
        "player's uuid" => Some(session.unique_id().to_string()),
        "player's server" => session.current_destination(),
        _ => None,
    }
}
