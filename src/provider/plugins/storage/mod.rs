//! Storage backends for global variables.
//!
//! This module contains implementations of the
//! [`VariableStore`](crate::provider::capabilities::storage::VariableStore)
//! capability.

pub mod in_memory;
pub mod local_fs;
