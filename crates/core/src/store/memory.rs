//! In-memory state store

use std::collections::HashMap;
use std::sync::RwLock;

use super::{StateStore, StoreError};

/// In-memory store backed by `HashMap<String, String>`
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create a new empty MemoryStore
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Number of keys currently held
    pub fn len(&self) -> usize {
        self.values.read().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self
            .values
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut values = self
            .values
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_missing_is_none() {
        let store = MemoryStore::new();
        assert_eq!(store.get("license.key").unwrap(), None);
    }

    #[test]
    fn set_overwrites_and_delete_removes() {
        let store = MemoryStore::new();
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
        assert_eq!(store.len(), 1);

        store.delete("k").unwrap();
        store.delete("k").unwrap();
        assert!(store.is_empty());
    }
}
