//! Top-level blocks: `command` and `on <event>`.

use std::collections::HashSet;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;

use super::block::{parse_trigger_body, skip_deeper};
use crate::analyzer::core::{Diagnostics, ParseErrorKind, Parsed};
use crate::ast::{CommandDef, EventKind, EventTrigger, Script};
use crate::tokenizer::{LineToken, MetadataKey, SourceLine};

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[a-zA-Z0-9_]+$").unwrap();
    static ref ARGUMENT: Regex = Regex::new(r"<([^<>]*)>").unwrap();
}

pub fn parse_script(name: &str, lines: &[SourceLine], diagnostics: &mut Diagnostics) -> Script {
    let mut script = Script::new(name);
    let mut pos = 0;
    while let Some(line) = lines.get(pos) {
        pos = match (&line.token, line.width) {
            (LineToken::Command { .. }, 0) => {
                let (next, command) = parse_command(lines, pos, &script.commands, diagnostics);
                script.commands.extend(command);
                next
            }
            (LineToken::Event(_), 0) => {
                let (next, event) = parse_event(name, lines, pos, diagnostics);
                script.events.extend(event);
                next
            }
            (LineToken::Trigger, width) => {
                diagnostics.report(
                    line,
                    ParseErrorKind::OrphanedTrigger,
                    "Trigger section found without a command definition",
                );
                skip_deeper(lines, pos + 1, width)
            }
            (LineToken::Command { .. } | LineToken::Event(_), width) => {
                diagnostics.report(
                    line,
                    ParseErrorKind::SyntaxError,
                    "Block headers must not be indented",
                );
                skip_deeper(lines, pos + 1, width)
            }
            (_, 0) => {
                diagnostics.report(
                    line,
                    ParseErrorKind::SyntaxError,
                    "Unrecognized syntax or missing indentation",
                );
                pos + 1
            }
            _ => {
                diagnostics.report(
                    line,
                    ParseErrorKind::OrphanedAction,
                    "Action found outside of a command or event",
                );
                pos + 1
            }
        };
    }
    script
}

/// `command /name <args>:` and its body. `None` when the header is rejected
/// or the body has no actions.
pub fn parse_command(
    lines: &[SourceLine],
    pos: usize,
    existing: &[CommandDef],
    diagnostics: &mut Diagnostics,
) -> Parsed<Option<CommandDef>> {
    let header = &lines[pos];
    let LineToken::Command { name, arguments } = &header.token else {
        return (pos + 1, None);
    };
    let body_end = skip_deeper(lines, pos + 1, 0);

    if !IDENTIFIER.is_match(name) {
        diagnostics.report(
            header,
            ParseErrorKind::InvalidCommand,
            format!("Invalid command name: {}", name),
        );
        return (body_end, None);
    }
    if existing.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
        diagnostics.report(
            header,
            ParseErrorKind::InvalidCommand,
            format!("Duplicate command: {}", name),
        );
        return (body_end, None);
    }

    let mut command = CommandDef::new(name.as_str());
    command.arguments = parse_arguments(header, arguments, diagnostics);

    let mut pos = pos + 1;
    while let Some(line) = lines.get(pos).filter(|line| line.width > 0) {
        pos = match &line.token {
            LineToken::Metadata { key, value } => {
                apply_metadata(&mut command, *key, value);
                pos + 1
            }
            LineToken::Trigger => {
                let (next, actions) = parse_trigger_body(lines, pos + 1, diagnostics);
                command.actions = actions;
                next
            }
            _ => {
                diagnostics.report(
                    line,
                    ParseErrorKind::OrphanedAction,
                    "Action found outside of trigger section",
                );
                skip_deeper(lines, pos + 1, line.width)
            }
        };
    }

    if command.actions.is_empty() {
        diagnostics.report(
            header,
            ParseErrorKind::EmptyCommand,
            "Command has no actions defined",
        );
        return (pos, None);
    }
    (pos, Some(command))
}

/// `on <event>:` and its body. A leading `trigger:` line is optional.
pub fn parse_event(
    script_name: &str,
    lines: &[SourceLine],
    pos: usize,
    diagnostics: &mut Diagnostics,
) -> Parsed<Option<EventTrigger>> {
    let header = &lines[pos];
    let LineToken::Event(event) = &header.token else {
        return (pos + 1, None);
    };
    let normalized = event.split_whitespace().collect::<Vec<_>>().join(" ");
    let Ok(kind) = EventKind::from_str(&normalized) else {
        diagnostics.report(
            header,
            ParseErrorKind::SyntaxError,
            format!("Unknown event type: {}", event),
        );
        return (skip_deeper(lines, pos + 1, 0), None);
    };

    let mut pos = pos + 1;
    if lines
        .get(pos)
        .is_some_and(|line| line.width > 0 && line.token == LineToken::Trigger)
    {
        pos += 1;
    }
    let (pos, actions) = parse_trigger_body(lines, pos, diagnostics);

    if actions.is_empty() {
        diagnostics.report(
            header,
            ParseErrorKind::EmptyCommand,
            "Event has no actions defined",
        );
        return (pos, None);
    }
    (
        pos,
        Some(EventTrigger {
            kind,
            script_name: script_name.to_string(),
            actions,
        }),
    )
}

/// `<a> <b>` section of a command header. Every `<...>` occurrence is a
/// declaration, glued ones included; text outside brackets is ignored.
/// Invalid or repeated names are reported and dropped.
fn parse_arguments(header: &SourceLine, section: &str, diagnostics: &mut Diagnostics) -> Vec<String> {
    let stray = ARGUMENT.replace_all(section, " ");
    if !stray.trim().is_empty() {
        warn!(
            "Line {}: ignoring text outside <...> in arguments: {}",
            header.number,
            stray.trim()
        );
    }
    let mut seen = HashSet::new();
    let mut arguments = Vec::new();
    for capture in ARGUMENT.captures_iter(section) {
        let name = &capture[1];
        if !IDENTIFIER.is_match(name) {
            diagnostics.report(
                header,
                ParseErrorKind::InvalidArgument,
                format!("Invalid argument name: {}", name),
            );
        } else if seen.insert(name.to_string()) {
            arguments.push(name.to_string());
        } else {
            diagnostics.report(
                header,
                ParseErrorKind::InvalidArgument,
                format!("Duplicate argument: {}", name),
            );
        }
    }
    arguments
}

fn apply_metadata(command: &mut CommandDef, key: MetadataKey, value: &str) {
    let text = || Some(value.to_string()).filter(|v| !v.is_empty());
    match key {
        MetadataKey::Permission => command.permission = text(),
        MetadataKey::PermissionMessage => command.permission_message = text(),
        MetadataKey::Usage => command.usage = text(),
        MetadataKey::Description => command.description = text(),
        MetadataKey::Aliases => {
            command.aliases = value
                .split(',')
                .map(|alias| alias.trim().trim_start_matches('/').trim())
                .filter(|alias| !alias.is_empty())
                .map(str::to_string)
                .collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Action, MessageTarget, SendMessage};
    use crate::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    fn kinds(diagnostics: Diagnostics) -> Vec<(usize, ParseErrorKind)> {
        diagnostics
            .into_errors()
            .into_iter()
            .map(|e| (e.line_number, e.kind))
            .collect()
    }

    #[test]
    fn test_parse_command_with_metadata() {
        let source = "\
command /pay <target> <amount>:
    permission: vsk.pay
    permission message: &cNope
    aliases: /give, send ,, /transfer
    usage: /pay <who> <amount>
    description: Pay someone
    trigger:
        send \"Paid\"
command /other:
";
        let lines = tokenize(source);
        let mut diagnostics = Diagnostics::new();
        let (rest, command) = parse_command(&lines, 0, &[], &mut diagnostics);
        assert_eq!(rest, 8);
        assert!(diagnostics.is_empty());

        let command = command.unwrap();
        assert_eq!(command.name, "pay");
        assert_eq!(command.arguments, vec!["target", "amount"]);
        assert_eq!(command.permission.as_deref(), Some("vsk.pay"));
        assert_eq!(command.permission_message.as_deref(), Some("&cNope"));
        assert_eq!(command.aliases, vec!["give", "send", "transfer"]);
        assert_eq!(command.usage.as_deref(), Some("/pay <who> <amount>"));
        assert_eq!(command.description.as_deref(), Some("Pay someone"));
        assert_eq!(
            command.actions,
            vec![Action::SendMessage(SendMessage {
                message: "Paid".to_string(),
                target: MessageTarget::Invoker,
            })]
        );
    }

    #[test]
    fn test_empty_permission_is_none() {
        let lines = tokenize("command /a:\n    permission:\n    trigger:\n        send \"x\"\n");
        let mut diagnostics = Diagnostics::new();
        let (_, command) = parse_command(&lines, 0, &[], &mut diagnostics);
        assert_eq!(command.unwrap().permission, None);
    }

    #[test]
    fn test_invalid_command_name_skips_body() {
        let lines = tokenize("command /bad-name:\n    trigger:\n        nonsense\n");
        let mut diagnostics = Diagnostics::new();
        let (rest, command) = parse_command(&lines, 0, &[], &mut diagnostics);
        assert_eq!(rest, 3);
        assert_eq!(command, None);
        assert_eq!(kinds(diagnostics), vec![(1, ParseErrorKind::InvalidCommand)]);
    }

    #[test]
    fn test_duplicate_command() {
        let existing = vec![CommandDef::new("Spawn")];
        let lines = tokenize("command /spawn:\n    trigger:\n        send \"x\"\n");
        let mut diagnostics = Diagnostics::new();
        let (rest, command) = parse_command(&lines, 0, &existing, &mut diagnostics);
        assert_eq!(rest, 3);
        assert_eq!(command, None);
        assert_eq!(kinds(diagnostics), vec![(1, ParseErrorKind::InvalidCommand)]);
    }

    #[test]
    fn test_invalid_arguments_are_dropped() {
        let lines = tokenize("command /a <ok> <b-ad> <ok> <>:\n    trigger:\n        send \"x\"\n");
        let mut diagnostics = Diagnostics::new();
        let (_, command) = parse_command(&lines, 0, &[], &mut diagnostics);
        assert_eq!(command.unwrap().arguments, vec!["ok"]);
        assert_eq!(
            kinds(diagnostics),
            vec![
                (1, ParseErrorKind::InvalidArgument),
                (1, ParseErrorKind::InvalidArgument),
                (1, ParseErrorKind::InvalidArgument),
            ]
        );
    }

    #[test]
    fn test_arguments_are_scanned_from_brackets() {
        let lines = tokenize("command /msg <target> text <x><y>:\n    trigger:\n        send \"x\"\n");
        let mut diagnostics = Diagnostics::new();
        let (_, command) = parse_command(&lines, 0, &[], &mut diagnostics);
        assert_eq!(command.unwrap().arguments, vec!["target", "x", "y"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_action_before_trigger() {
        let lines = tokenize("command /a:\n    send \"early\"\n    trigger:\n        send \"x\"\n");
        let mut diagnostics = Diagnostics::new();
        let (_, command) = parse_command(&lines, 0, &[], &mut diagnostics);
        assert!(command.is_some());
        assert_eq!(kinds(diagnostics), vec![(2, ParseErrorKind::OrphanedAction)]);
    }

    #[test]
    fn test_empty_command_reports_header() {
        let lines = tokenize("# c\ncommand /a:\n    trigger:\ncommand /b:\n");
        let mut diagnostics = Diagnostics::new();
        let (rest, command) = parse_command(&lines, 0, &[], &mut diagnostics);
        assert_eq!(rest, 2);
        assert_eq!(command, None);
        let errors = diagnostics.into_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line_number, 2);
        assert_eq!(errors[0].line, "command /a:");
        assert_eq!(errors[0].kind, ParseErrorKind::EmptyCommand);
    }

    #[test]
    fn test_parse_event() {
        let lines = tokenize("on Server  Switch:\n    send \"moved\"\non join:\n    trigger:\n        send \"hi\"\n");
        let mut diagnostics = Diagnostics::new();
        let (rest, event) = parse_event("hub", &lines, 0, &mut diagnostics);
        assert_eq!(rest, 2);
        let event = event.unwrap();
        assert_eq!(event.kind, EventKind::ServerSwitch);
        assert_eq!(event.script_name, "hub");

        let (rest, event) = parse_event("hub", &lines, rest, &mut diagnostics);
        assert_eq!(rest, 5);
        assert_eq!(event.unwrap().kind, EventKind::Join);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unknown_event() {
        let lines = tokenize("on teleport:\n    send \"x\"\n");
        let mut diagnostics = Diagnostics::new();
        let (rest, event) = parse_event("hub", &lines, 0, &mut diagnostics);
        assert_eq!(rest, 2);
        assert_eq!(event, None);
        assert_eq!(kinds(diagnostics), vec![(1, ParseErrorKind::SyntaxError)]);
    }

    #[test]
    fn test_event_rejects_metadata() {
        let lines = tokenize("on quit:\n    permission: x\n    send \"bye\"\n");
        let mut diagnostics = Diagnostics::new();
        let (_, event) = parse_event("hub", &lines, 0, &mut diagnostics);
        assert!(event.is_some());
        assert_eq!(kinds(diagnostics), vec![(2, ParseErrorKind::SyntaxError)]);
    }

    #[test]
    fn test_top_level_errors() {
        let source = "\
trigger:
    send \"a\"
send \"b\"
    send \"c\"
  command /x:
";
        let lines = tokenize(source);
        let mut diagnostics = Diagnostics::new();
        let script = parse_script("broken", &lines, &mut diagnostics);
        assert!(script.commands.is_empty());
        assert_eq!(
            kinds(diagnostics),
            vec![
                (1, ParseErrorKind::OrphanedTrigger),
                (3, ParseErrorKind::SyntaxError),
                (4, ParseErrorKind::OrphanedAction),
                (5, ParseErrorKind::SyntaxError),
            ]
        );
    }
}
