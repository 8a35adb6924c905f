//! JSON-file state store (`~/.config/keyward/state.json` by default)

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;

use super::{StateStore, StoreError};

const STATE_FILENAME: &str = "state.json";

/// Store that keeps every key in one JSON object file.
///
/// Each write holds an exclusive lock on a sidecar `.lock` file while it
/// reads the current map, applies the change and persists a uniquely named
/// temp file over the original. Concurrent processes therefore serialize
/// per key and a crash never leaves half a write.
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Store at `<config_dir>/keyward/state.json`, creating the directory if needed.
    pub fn in_config_dir() -> Result<Self, StoreError> {
        let dir = dirs::config_dir()
            .ok_or_else(|| {
                StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "could not determine config directory",
                ))
            })?
            .join("keyward");
        std::fs::create_dir_all(&dir)?;
        Ok(Self::new(dir.join(STATE_FILENAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn parent_dir(&self) -> Result<PathBuf, StoreError> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;
        Ok(parent)
    }

    fn lock_exclusive(&self) -> Result<File, StoreError> {
        self.parent_dir()?;
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())?;
        FileExt::lock_exclusive(&file)?;
        Ok(file)
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(values)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let mut temp = tempfile::NamedTempFile::new_in(self.parent_dir()?)?;
        temp.write_all(&json)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn modify(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        let lock_file = self.lock_exclusive()?;
        let mut values = self.read_all()?;
        f(&mut values);
        let result = self.write_all(&values);
        drop(lock_file);
        result
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.modify(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.modify(|values| {
            values.remove(key);
        })
    }
}
