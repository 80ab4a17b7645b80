//! Host implementations that need no running proxy.

pub mod in_memory;
