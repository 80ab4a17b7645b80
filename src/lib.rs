//! # VSK: proxy scripting
//!
//! VSK lets server operators define chat commands and reactions to proxy
//! lifecycle events in a small, indentation-structured scripting language.
//!
//! ```text
//! command /lobby:
//!     aliases: hub
//!     trigger:
//!         transfer player to "lobby"
//!         send "&aWelcome back, %player%!"
//!
//! on join:
//!     if {visits::%player%} is not set:
//!         send "First time here? Try /lobby" to player
//!     set {visits::%player%} to "seen"
//! ```
//!
//! ## Processing pipeline
//!
//! ```text
//! Source → Tokenizer → Analyzer → Script → Runtime → Executor → Host
//! ```
//!
//! - [`tokenizer`] classifies each meaningful line and measures its indentation.
//! - [`analyzer`] builds the [`ast`] by recursive descent, collecting every
//!   diagnostic instead of stopping at the first.
//! - [`loader`] reads `.vsk` files from a directory.
//! - [`runtime`] indexes commands and event triggers and creates one
//!   [`eval::context::ExecutionContext`] per invocation.
//! - [`eval`] substitutes placeholders, evaluates conditions and performs
//!   actions against the [`provider::capabilities::host::ProxyHost`].
//!
//! ## Variables
//!
//! [`variable`] stores `{global}` variables in a write-through cache backed
//! by a [`provider::capabilities::storage::VariableStore`], and `{_local}`
//! variables in a scope that lives exactly as long as one invocation.

pub mod analyzer;
pub mod ast;
pub mod config;
pub mod error;
pub mod eval;
pub mod event;
pub mod loader;
pub mod provider;
pub mod runtime;
pub mod tokenizer;
pub mod variable;

// Re-exports
pub use analyzer::{parse, ParseError, ParseErrorKind};
pub use ast::*;
pub use error::*;
pub use event::HostEvent;
pub use runtime::{CommandOutcome, ScriptRuntime};
