//! Bundled implementations of the host capabilities.

pub mod host;
pub mod storage;
