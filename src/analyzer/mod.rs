//! # Script Analyzer
//!
//! Second stage of parsing: turns the classified lines from
//! [`tokenizer`](crate::tokenizer) into a [`Script`].
//!
//! Parsing never stops at the first problem. Every diagnostic is collected so
//! an author sees all of them at once, and a script with any diagnostic is
//! rejected as a whole by [`parse`].
//!
//! ```
//! let script = vsk::analyzer::parse("command /hi:\n    trigger:\n        send \"Hi!\"\n")
//!     .unwrap();
//! assert_eq!(script.commands[0].name, "hi");
//! ```

pub mod core;
pub mod parsers;

pub use self::core::{Diagnostics, ParseError, ParseErrorKind, Parsed};

use crate::ast::Script;
use crate::tokenizer::tokenize;

pub fn parse(source: &str) -> Result<Script, Vec<ParseError>> {
    parse_named("", source)
}

/// Parse `source` as the script called `name`.
pub fn parse_named(name: &str, source: &str) -> Result<Script, Vec<ParseError>> {
    match analyze(name, source) {
        (script, errors) if errors.is_empty() => Ok(script),
        (_, errors) => Err(errors),
    }
}

/// Parse without rejecting: the partially built script and every diagnostic.
#[tracing::instrument(level = "debug", skip(source))]
pub fn analyze(name: &str, source: &str) -> (Script, Vec<ParseError>) {
    let lines = tokenize(source);
    let mut diagnostics = Diagnostics::new();
    let script = parsers::parse_script(name, &lines, &mut diagnostics);
    (script, diagnostics.into_errors())
}
