use thiserror::Error;

use crate::analyzer::ParseError;
use crate::config::ConfigError;
use crate::eval::executor::ExecutionError;
use crate::loader::LoadError;
use crate::provider::capabilities::host::HostError;
use crate::provider::capabilities::storage::StorageError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Host error: {0}")]
    Host(#[from] HostError),
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VskResult<T> = Result<T, Error>;

impl Error {
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Error::Internal(message.into())
    }
}
