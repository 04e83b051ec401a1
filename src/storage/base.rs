use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::{file_storage::FileStorage, memory_storage::MemoryStorage, no_storage::NoStorage};
use crate::config::{StorageBackend, StorageConfig};

/// Key under which the current user id is mirrored.
pub const USER_ID_KEY: &str = "userId";
/// Key under which the current account type is mirrored.
pub const ACCOUNT_TYPE_KEY: &str = "accountType";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is not a JSON object of strings: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("durable storage is disabled")]
    Disabled,
    #[error("storage is enabled, but no backend is configured")]
    Misconfigured,
    #[error("storage lock poisoned")]
    Poisoned,
}

/// Synchronous string key/value storage that outlives a single mount, in
/// the manner of browser local storage.
pub trait DurableStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
    fn is_enabled(&self) -> bool {
        // Only NoStorage reports false, so logs can say why nothing persisted.
        true
    }
}

/// Creates the storage backend selected by `config`.
/// If `enabled = false`, returns NoStorage regardless of the backend.
pub fn create_storage(config: &StorageConfig) -> Result<Arc<dyn DurableStorage>, StorageError> {
    if !config.enabled {
        info!("Durable storage is disabled. Using NoStorage.");
        return Ok(Arc::new(NoStorage::new()));
    }

    match &config.backend {
        Some(StorageBackend::Memory) => {
            info!("Using in-memory durable storage.");
            Ok(Arc::new(MemoryStorage::new()))
        }
        Some(StorageBackend::File(file_config)) => {
            let storage = FileStorage::open(&file_config.path)?;
            info!("Using file durable storage at '{}'.", file_config.path);
            Ok(Arc::new(storage))
        }
        None => Err(StorageError::Misconfigured),
    }
}
