//! Recursive-descent parsers over the tokenized line stream.
//!
//! Each parser takes the line slice and a start position, reports problems
//! into a [`Diagnostics`](crate::analyzer::core::Diagnostics) sink and returns
//! the position after what it consumed. Block context (base width, owning
//! command) travels as arguments; no parser keeps state between calls.

pub mod action;
pub mod block;
pub mod script;

pub use action::parse_action;
pub use block::{parse_conditional, parse_statement, parse_trigger_body};
pub use script::{parse_command, parse_event, parse_script};
