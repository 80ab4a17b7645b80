use strum::Display;
use thiserror::Error;

use crate::tokenizer::SourceLine;

/// Position after the consumed lines, and the parsed value.
pub type Parsed<O> = (usize, O);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ParseErrorKind {
    SyntaxError,
    InvalidCommand,
    InvalidArgument,
    OrphanedTrigger,
    OrphanedAction,
    EmptyCommand,
    InvalidTarget,
}

/// One structural problem, tied to the offending source line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[Line {line_number}] {kind}: {message}\n    {}", .line.trim())]
pub struct ParseError {
    pub line_number: usize,
    pub line: String,
    pub message: String,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: &SourceLine, kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self {
            line_number: line.number,
            line: line.raw.clone(),
            message: message.into(),
            kind,
        }
    }
}

/// Error sink threaded through the parsers. Parsing never stops at the
/// first problem.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<ParseError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, line: &SourceLine, kind: ParseErrorKind, message: impl Into<String>) {
        self.errors.push(ParseError::new(line, kind, message));
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn into_errors(self) -> Vec<ParseError> {
        self.errors
    }
}
