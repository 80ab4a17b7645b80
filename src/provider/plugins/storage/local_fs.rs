//! Local file system backend for global variables.
//!
//! Every row lives in a single JSON file holding an array of
//! [`StoredVariable`]s. The whole file is rewritten on each mutation through a
//! temporary file and an atomic rename, so a crash never leaves a truncated
//! file behind.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::provider::capabilities::storage::{StorageError, StoredVariable, VariableStore};

/// File-backed store for global variables
///
/// # Thread Safety
///
/// Rows are cached behind a mutex which also serialises file writes. The
/// cache is updated only after the file has been replaced, so memory and
/// disk never disagree.
///
/// # Error Handling
///
/// I/O problems surface as [`StorageError::StorageError`], malformed files as
/// [`StorageError::DeserializationError`].
#[derive(Debug)]
pub struct LocalFileStore {
    path: PathBuf,
    rows: Mutex<BTreeMap<String, StoredVariable>>,
}

impl LocalFileStore {
    /// Open the store at `path`, reading existing rows if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let rows = read_rows(&path)?;
        debug!("Opened variable store {} ({} rows)", path.display(), rows.len());
        Ok(Self {
            path,
            rows: Mutex::new(rows),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, StoredVariable>>, StorageError> {
        self.rows
            .lock()
            .map_err(|_| StorageError::Unavailable("store lock poisoned".to_string()))
    }

    /// Apply `change` to a copy of the rows, persist it, then commit it.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, StoredVariable>) -> T,
    ) -> Result<T, StorageError> {
        let mut rows = self.lock()?;
        let mut next = rows.clone();
        let out = change(&mut next);
        write_atomically(&self.path, &next)?;
        *rows = next;
        Ok(out)
    }
}

fn read_rows(path: &Path) -> Result<BTreeMap<String, StoredVariable>, StorageError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let file = fs::File::open(path)
        .map_err(|e| StorageError::StorageError(format!("Failed to open file: {}", e)))?;
    let rows: Vec<StoredVariable> = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| StorageError::DeserializationError(e.to_string()))?;
    Ok(rows.into_iter().map(|r| (r.name.clone(), r)).collect())
}

fn write_atomically(
    path: &Path,
    rows: &BTreeMap<String, StoredVariable>,
) -> Result<(), StorageError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .map_err(|e| StorageError::InvalidPath(format!("Failed to create directory: {}", e)))?;

    let body: Vec<&StoredVariable> = rows.values().collect();
    let data = serde_json::to_vec_pretty(&body)
        .map_err(|e| StorageError::SerializationError(e.to_string()))?;

    let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
        StorageError::StorageError(format!("Failed to create temporary file: {}", e))
    })?;
    temp_file
        .write_all(&data)
        .map_err(|e| StorageError::StorageError(format!("Failed to write to file: {}", e)))?;
    temp_file
        .flush()
        .map_err(|e| StorageError::StorageError(format!("Failed to flush file: {}", e)))?;
    temp_file
        .persist(path)
        .map_err(|e| StorageError::StorageError(format!("Failed to rename file: {}", e)))?;
    Ok(())
}

impl VariableStore for LocalFileStore {
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.mutate(|rows| {
            rows.insert(key.to_string(), StoredVariable::now(key, value));
        })
    }

    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).map(|r| r.value.clone()))
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        if !self.lock()?.contains_key(key) {
            return Ok(());
        }
        self.mutate(|rows| {
            rows.remove(key);
        })
    }

    fn load_all(&self) -> Result<HashMap<String, String>, StorageError> {
        Ok(self
            .lock()?
            .values()
            .map(|r| (r.name.clone(), r.value.clone()))
            .collect())
    }

    fn delete_by_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        self.mutate(|rows| {
            let before = rows.len();
            rows.retain(|k, _| !k.starts_with(prefix));
            before - rows.len()
        })
    }

    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }
}
