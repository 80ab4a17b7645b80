//! Run-time evaluation of parsed scripts.
//!
//! # Components
//!
//! ## Execution Context
//! Per-invocation state: acting session, arguments, event data and the
//! transient variable scope.
//!
//! ## Expressions and Conditions
//! Single-term expressions and boolean predicates, compiled once and
//! evaluated against a context.
//!
//! ## Placeholders
//! Whole-text substitution of `%key%` and `{...}` tokens in message bodies.
//!
//! ## Executor
//! Walks an action list against a context, performing effects through the
//! host capabilities.

pub mod color;
pub mod condition;
pub mod context;
pub mod executor;
pub mod expression;
pub mod placeholder;
