use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path, path::PathBuf, str::FromStr, sync::Arc};
use thiserror::Error;

use crate::provider::capabilities::storage::{StorageError, VariableStore};
use crate::provider::plugins::storage::{in_memory::InMemoryStore, local_fs::LocalFileStore};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to open config file: {0}")]
    Io(String),
    #[error("Failed to parse config: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VskConfig {
    /// Directory scanned for `.vsk` files
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Translate `&` colour codes in sent messages
    #[serde(default = "default_true")]
    pub translate_color_codes: bool,

    #[serde(default)]
    pub messages: MessageConfig,
}

/// Where global variables are persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageConfig {
    #[default]
    InMemory,
    LocalFile {
        #[serde(default = "default_storage_path")]
        path: PathBuf,
    },
}

impl StorageConfig {
    /// Open the configured store.
    pub fn open(&self) -> Result<Arc<dyn VariableStore>, StorageError> {
        Ok(match self {
            StorageConfig::InMemory => Arc::new(InMemoryStore::new()),
            StorageConfig::LocalFile { path } => Arc::new(LocalFileStore::open(path)?),
        })
    }
}

/// User-facing notices sent by the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageConfig {
    #[serde(default = "default_permission_denied")]
    pub permission_denied: String,

    /// Prepended to the usage line
    #[serde(default = "default_usage_prefix")]
    pub usage_prefix: String,

    #[serde(default = "default_command_failed")]
    pub command_failed: String,

    /// `{server}` is replaced by the destination name
    #[serde(default = "default_server_not_found")]
    pub server_not_found: String,

    #[serde(default = "default_players_only")]
    pub players_only: String,
}

impl Default for MessageConfig {
    fn default() -> Self {
        Self {
            permission_denied: default_permission_denied(),
            usage_prefix: default_usage_prefix(),
            command_failed: default_command_failed(),
            server_not_found: default_server_not_found(),
            players_only: default_players_only(),
        }
    }
}

impl Default for VskConfig {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            storage: StorageConfig::default(),
            translate_color_codes: default_true(),
            messages: MessageConfig::default(),
        }
    }
}

impl VskConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

impl FromStr for VskConfig {
    type Err = ConfigError;

    fn from_str(json: &str) -> Result<Self, Self::Err> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("scripts")
}
fn default_storage_path() -> PathBuf {
    PathBuf::from("variables.json")
}
fn default_true() -> bool {
    true
}
fn default_permission_denied() -> String {
    "§cYou don't have permission to use this command.".to_string()
}
fn default_usage_prefix() -> String {
    "§cUsage: ".to_string()
}
fn default_command_failed() -> String {
    "§cAn error occurred while executing this command.".to_string()
}
fn default_server_not_found() -> String {
    "§cServer not found: {server}".to_string()
}
fn default_players_only() -> String {
    "This command can only be executed by a player.".to_string()
}
