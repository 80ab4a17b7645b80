//! # Script Tokenizer
//!
//! First stage of the two-stage parsing pipeline. Script source is split into
//! lines and every meaningful line becomes one [`SourceLine`]: its 1-based
//! number, its original text, its indentation width and a [`LineToken`]
//! saying what kind of line it is.
//!
//! ## Pipeline
//!
//! ```text
//! source text --tokenize--> Vec<SourceLine> --analyzer--> Script
//! ```
//!
//! The tokenizer never fails. It does not know about blocks or nesting; it
//! only classifies lines. Structure (which block a line belongs to, where a
//! conditional ends) is the analyzer's job.
//!
//! ## Skipped lines
//!
//! * Blank lines
//! * Lines whose trimmed content starts with `#`
//!
//! A leading byte order mark is removed and both `\n` and `\r\n` line endings
//! are accepted.
//!
//! ## Indentation
//!
//! Width is measured in columns: a tab counts 4, a space counts 1. See
//! [`indent::width`].

pub mod indent;
pub mod token;

pub use token::{LineToken, MetadataKey, SourceLine};

/// Split `source` into classified lines, dropping blanks and comments.
#[tracing::instrument(level = "debug", skip(source))]
pub fn tokenize(source: &str) -> Vec<SourceLine> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    source
        .lines()
        .enumerate()
        .filter_map(|(index, raw)| {
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                return None;
            }
            Some(SourceLine {
                number: index + 1,
                raw: raw.to_string(),
                width: indent::width(raw),
                token: LineToken::classify(text),
            })
        })
        .collect()
}
