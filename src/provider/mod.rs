//! Host-facing seams of the scripting core.
//!
//! [`capabilities`] defines the traits the core consumes; [`plugins`] ships
//! in-memory and file-backed implementations used by the CLI and the tests.

pub mod capabilities;
pub mod plugins;
