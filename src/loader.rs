//! Script discovery and loading.
//!
//! Active scripts are the `*.vsk` files directly inside the scripts
//! directory; `*.vsk.disabled` files are never loaded. A script with any parse
//! error is rejected as a whole and its diagnostics go to the operator log.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use thiserror::Error;
use tracing::{error, info};

use crate::analyzer::{parse_named, ParseError};
use crate::ast::Script;

pub const SCRIPT_EXTENSION: &str = "vsk";

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LoadError {
    #[error("Failed to read {path}: {message}")]
    Io { path: PathBuf, message: String },

    #[error("Invalid scripts directory pattern: {0}")]
    Pattern(String),

    #[error("Script not found: {0}")]
    NotFound(String),

    #[error("{name}: {} parse error(s)", .errors.len())]
    Parse { name: String, errors: Vec<ParseError> },
}

/// Scripts that loaded, and the files that did not.
#[derive(Debug, Default)]
pub struct LoadResult {
    pub scripts: Vec<Script>,
    pub failures: Vec<LoadError>,
}

impl LoadResult {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct ScriptLoader {
    dir: PathBuf,
}

impl ScriptLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Active script files, sorted by path.
    pub fn script_files(&self) -> Result<Vec<PathBuf>, LoadError> {
        let pattern = format!(
            "{}/*.{}",
            Pattern::escape(&self.dir.to_string_lossy()),
            SCRIPT_EXTENSION
        );
        let paths = glob::glob(&pattern).map_err(|e| LoadError::Pattern(e.to_string()))?;
        let mut files: Vec<PathBuf> = paths
            .filter_map(|entry| match entry {
                Ok(path) if path.is_file() => Some(path),
                Ok(_) => None,
                Err(e) => {
                    error!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .collect();
        files.sort();
        Ok(files)
    }

    /// Parse every active script in the directory.
    pub fn load_all(&self) -> LoadResult {
        let mut result = LoadResult::default();
        let files = match self.script_files() {
            Ok(files) => files,
            Err(e) => {
                error!("{}", e);
                result.failures.push(e);
                return result;
            }
        };
        for path in files {
            match Self::parse_file(&path) {
                Ok(script) => result.scripts.push(script),
                Err(e) => result.failures.push(e),
            }
        }
        info!(
            "Loaded {} script(s) from {} ({} rejected)",
            result.scripts.len(),
            self.dir.display(),
            result.failures.len()
        );
        result
    }

    /// Parse one script by file name, with or without the extension.
    pub fn load_one(&self, file_name: &str) -> Result<Script, LoadError> {
        let mut path = self.dir.join(file_name);
        if path.extension().is_none_or(|ext| ext != SCRIPT_EXTENSION) {
            path = self.dir.join(format!("{}.{}", file_name, SCRIPT_EXTENSION));
        }
        if !path.is_file() {
            return Err(LoadError::NotFound(file_name.to_string()));
        }
        Self::parse_file(&path)
    }

    /// Parse the file at `path`, naming the script after its file stem.
    pub fn parse_file(path: &Path) -> Result<Script, LoadError> {
        let source = fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let name = script_name(path);
        parse_named(&name, &source).map_err(|errors| {
            error!("Failed to parse script {} ({} error(s))", name, errors.len());
            for e in &errors {
                error!("{}", e);
            }
            LoadError::Parse { name, errors }
        })
    }
}

/// `lobby.vsk` and `lobby.vsk.disabled` are both named `lobby`.
pub fn script_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = file_name.strip_suffix(".disabled").unwrap_or(&file_name);
    file_name
        .strip_suffix(&format!(".{}", SCRIPT_EXTENSION))
        .unwrap_or(file_name)
        .to_string()
}
