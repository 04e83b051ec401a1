use std::collections::HashMap;
use std::sync::Mutex;

use super::{DurableStorage, StorageError};

/// Process-local storage. Entries live as long as the value itself; share it
/// through an `Arc` to keep them across store mounts.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DurableStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert!(storage.is_empty());

        storage.set_item("userId", "u1").unwrap();
        storage.set_item("userId", "u2").unwrap();
        assert_eq!(storage.get_item("userId").unwrap().as_deref(), Some("u2"));
        assert_eq!(storage.len(), 1);

        storage.remove_item("userId").unwrap();
        assert!(storage.get_item("userId").unwrap().is_none());
        // Removing a missing key is not an error.
        storage.remove_item("userId").unwrap();
    }
}
