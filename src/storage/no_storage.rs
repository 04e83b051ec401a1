use super::{DurableStorage, StorageError};

/// A storage that persists nothing. Every call reports that storage is
/// disabled.
pub struct NoStorage;

impl NoStorage {
    pub fn new() -> Self {
        NoStorage
    }
}

impl Default for NoStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl DurableStorage for NoStorage {
    fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Disabled)
    }

    fn set_item(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Disabled)
    }

    fn remove_item(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Disabled)
    }

    fn is_enabled(&self) -> bool {
        false
    }
}
