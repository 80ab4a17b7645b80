//! Trigger bodies and conditional groups.
//!
//! Every function takes the full line slice and a start position and returns
//! the position of the first line it did not consume.

use tracing::warn;

use super::action::parse_action;
use crate::analyzer::core::{Diagnostics, ParseErrorKind, Parsed};
use crate::ast::{Action, Conditional};
use crate::eval::condition::Condition;
use crate::tokenizer::{indent::ACTION_WIDTH, LineToken, SourceLine};

/// First position at or after `pos` whose width is at most `width`.
pub fn skip_deeper(lines: &[SourceLine], pos: usize, width: usize) -> usize {
    lines[pos..]
        .iter()
        .position(|line| line.width <= width)
        .map_or(lines.len(), |offset| pos + offset)
}

/// Action body of a command or event, up to the next unindented line.
pub fn parse_trigger_body(
    lines: &[SourceLine],
    pos: usize,
    diagnostics: &mut Diagnostics,
) -> Parsed<Vec<Action>> {
    let mut pos = pos;
    let mut actions = Vec::new();
    while let Some(line) = lines.get(pos).filter(|line| line.width > 0) {
        if line.width < ACTION_WIDTH {
            diagnostics.report(
                line,
                ParseErrorKind::SyntaxError,
                "Action lines must be indented by a tab or four spaces",
            );
            pos += 1;
            continue;
        }
        let (next, action) = parse_statement(lines, pos, diagnostics);
        actions.extend(action);
        pos = next;
    }
    (pos, actions)
}

/// One line inside a body: an action, or an `if` with everything it owns.
pub fn parse_statement(
    lines: &[SourceLine],
    pos: usize,
    diagnostics: &mut Diagnostics,
) -> Parsed<Option<Action>> {
    let line = &lines[pos];
    match &line.token {
        LineToken::If(_) => {
            let (next, conditional) = parse_conditional(lines, pos, diagnostics);
            (next, Some(Action::Conditional(conditional)))
        }
        LineToken::Else | LineToken::ElseIf(_) => {
            diagnostics.report(
                line,
                ParseErrorKind::SyntaxError,
                "Else without a matching if at the same indentation",
            );
            (skip_deeper(lines, pos + 1, line.width), None)
        }
        LineToken::Trigger => {
            diagnostics.report(line, ParseErrorKind::SyntaxError, "Unexpected trigger section");
            (pos + 1, None)
        }
        LineToken::Metadata { .. } => {
            diagnostics.report(line, ParseErrorKind::SyntaxError, "Metadata is not allowed here");
            (pos + 1, None)
        }
        LineToken::Command { .. } | LineToken::Event(_) => {
            diagnostics.report(
                line,
                ParseErrorKind::SyntaxError,
                "Block headers must not be indented",
            );
            (skip_deeper(lines, pos + 1, line.width), None)
        }
        LineToken::Statement(text) => match parse_action(text) {
            Ok(action) => (pos + 1, Some(action)),
            Err((kind, message)) => {
                diagnostics.report(line, kind, message);
                (pos + 1, None)
            }
        },
    }
}

/// `if` or `else if` at `pos`, its branch, and any `else`/`else if` at the
/// same width. An `else if` becomes a conditional alone in the else branch.
pub fn parse_conditional(
    lines: &[SourceLine],
    pos: usize,
    diagnostics: &mut Diagnostics,
) -> Parsed<Conditional> {
    let header = &lines[pos];
    let base = header.width;
    let text = match &header.token {
        LineToken::If(text) | LineToken::ElseIf(text) => text.as_str(),
        _ => "",
    };
    let condition = Condition::parse(text);
    if !condition.is_recognized() {
        warn!(
            line = header.number,
            condition = text,
            "Unrecognized condition always evaluates to true"
        );
    }

    let (pos, if_branch) = parse_branch(lines, pos + 1, base, diagnostics);
    let (pos, else_branch) = match lines.get(pos).filter(|line| line.width == base) {
        Some(line) if line.token == LineToken::Else => {
            parse_branch(lines, pos + 1, base, diagnostics)
        }
        Some(SourceLine {
            token: LineToken::ElseIf(_),
            ..
        }) => {
            let (next, nested) = parse_conditional(lines, pos, diagnostics);
            (next, vec![Action::Conditional(nested)])
        }
        _ => (pos, Vec::new()),
    };

    (
        pos,
        Conditional {
            condition,
            if_branch,
            else_branch,
        },
    )
}

/// Lines deeper than `base`. The first one fixes the branch width.
fn parse_branch(
    lines: &[SourceLine],
    pos: usize,
    base: usize,
    diagnostics: &mut Diagnostics,
) -> Parsed<Vec<Action>> {
    let Some(body) = lines.get(pos).map(|line| line.width).filter(|w| *w > base) else {
        return (pos, Vec::new());
    };
    let mut pos = pos;
    let mut actions = Vec::new();
    while let Some(line) = lines.get(pos).filter(|line| line.width > base) {
        if line.width != body {
            diagnostics.report(line, ParseErrorKind::SyntaxError, "Inconsistent indentation");
            pos += 1;
            continue;
        }
        let (next, action) = parse_statement(lines, pos, diagnostics);
        actions.extend(action);
        pos = next;
    }
    (pos, actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{MessageTarget, SendMessage};
    use crate::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    fn send(text: &str) -> Action {
        Action::SendMessage(SendMessage {
            message: text.to_string(),
            target: MessageTarget::Invoker,
        })
    }

    #[test]
    fn test_trigger_body_stops_at_top_level() {
        let lines = tokenize("    send \"a\"\n    send \"b\"\ncommand /next:\n");
        let mut diagnostics = Diagnostics::new();
        let (rest, actions) = parse_trigger_body(&lines, 0, &mut diagnostics);
        assert_eq!(rest, 2);
        assert_eq!(actions, vec![send("a"), send("b")]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_trigger_body_rejects_shallow_lines() {
        let lines = tokenize("  send \"a\"\n\tsend \"b\"\n");
        let mut diagnostics = Diagnostics::new();
        let (rest, actions) = parse_trigger_body(&lines, 0, &mut diagnostics);
        assert_eq!(rest, 2);
        assert_eq!(actions, vec![send("b")]);
        let errors = diagnostics.into_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line_number, 1);
        assert_eq!(errors[0].kind, ParseErrorKind::SyntaxError);
    }

    #[test]
    fn test_if_else() {
        let source = "\
    if {_x} is set:
        send \"yes\"
    else:
        send \"no\"
    send \"after\"
";
        let lines = tokenize(source);
        let mut diagnostics = Diagnostics::new();
        let (rest, conditional) = parse_conditional(&lines, 0, &mut diagnostics);
        assert_eq!(rest, 4);
        assert_eq!(conditional.condition, Condition::IsSet("{_x}".to_string()));
        assert_eq!(conditional.if_branch, vec![send("yes")]);
        assert_eq!(conditional.else_branch, vec![send("no")]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_else_if_chain_nests() {
        let source = "\
\tif {_n} > 10:
\t\tsend \"big\"
\telse if {_n} > 5:
\t\tsend \"medium\"
\telse:
\t\tsend \"small\"
";
        let lines = tokenize(source);
        let mut diagnostics = Diagnostics::new();
        let (rest, conditional) = parse_conditional(&lines, 0, &mut diagnostics);
        assert_eq!(rest, 6);
        assert_eq!(conditional.if_branch, vec![send("big")]);
        let [Action::Conditional(nested)] = conditional.else_branch.as_slice() else {
            panic!("expected a nested conditional, got {:?}", conditional.else_branch);
        };
        assert_eq!(nested.if_branch, vec![send("medium")]);
        assert_eq!(nested.else_branch, vec![send("small")]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_nested_if_owns_its_else() {
        let source = "\
    if {a} is set:
        if {b} is set:
            send \"both\"
        else:
            send \"only a\"
    send \"done\"
";
        let lines = tokenize(source);
        let mut diagnostics = Diagnostics::new();
        let (rest, outer) = parse_conditional(&lines, 0, &mut diagnostics);
        assert_eq!(rest, 5);
        assert!(outer.else_branch.is_empty());
        let [Action::Conditional(inner)] = outer.if_branch.as_slice() else {
            panic!("expected a nested conditional");
        };
        assert_eq!(inner.if_branch, vec![send("both")]);
        assert_eq!(inner.else_branch, vec![send("only a")]);
    }

    #[test]
    fn test_inconsistent_branch_indentation() {
        let source = "\
    if {a} is set:
        send \"one\"
          send \"two\"
        send \"three\"
";
        let lines = tokenize(source);
        let mut diagnostics = Diagnostics::new();
        let (rest, conditional) = parse_conditional(&lines, 0, &mut diagnostics);
        assert_eq!(rest, 4);
        assert_eq!(conditional.if_branch, vec![send("one"), send("three")]);
        let errors = diagnostics.into_errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line_number, 3);
        assert_eq!(errors[0].message, "Inconsistent indentation");
    }

    #[test]
    fn test_stray_else_skips_its_body() {
        let lines = tokenize("    else:\n        send \"x\"\n    send \"y\"\n");
        let mut diagnostics = Diagnostics::new();
        let (rest, action) = parse_statement(&lines, 0, &mut diagnostics);
        assert_eq!(rest, 2);
        assert_eq!(action, None);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_empty_branch_is_allowed() {
        let lines = tokenize("    if {a} is set:\n    send \"after\"\n");
        let mut diagnostics = Diagnostics::new();
        let (rest, conditional) = parse_conditional(&lines, 0, &mut diagnostics);
        assert_eq!(rest, 1);
        assert!(conditional.if_branch.is_empty());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_skip_deeper() {
        let lines = tokenize("a\n    b\n        c\n    d\ne\n");
        assert_eq!(skip_deeper(&lines, 1, 0), 4);
        assert_eq!(skip_deeper(&lines, 2, 4), 3);
        assert_eq!(skip_deeper(&lines, 5, 0), 5);
    }
}
