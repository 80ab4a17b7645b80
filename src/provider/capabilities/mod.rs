//! Capabilities the scripting core consumes from its host.
//!
//! * [`host`]: session and destination directories, session handles
//! * [`storage`]: durable key/value persistence for global variables

pub mod host;
pub mod storage;
