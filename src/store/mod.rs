//! Key-value store backends
//!
//! The vault only needs an asynchronous string-to-string map. Keys are
//! shared with the rest of the application, so implementations must not
//! interpret or filter them.

mod disk;
mod memory;

pub use disk::SledStore;
pub use memory::MemoryStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::StoreError;
use async_trait::async_trait;
use std::sync::Arc;

/// Result alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Asynchronous string-keyed store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch one value
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Snapshot of every entry, in the backend's iteration order
    async fn get_all(&self) -> StoreResult<Vec<(String, String)>>;

    /// Insert or overwrite entries
    async fn set(&self, entries: Vec<(String, String)>) -> StoreResult<()>;

    /// Delete the given keys; missing keys are ignored
    async fn remove(&self, keys: &[String]) -> StoreResult<()>;

    /// Delete everything
    async fn clear(&self) -> StoreResult<()>;

    /// Every key, in the backend's iteration order
    async fn keys(&self) -> StoreResult<Vec<String>> {
        Ok(self.get_all().await?.into_iter().map(|(k, _)| k).collect())
    }
}

/// Open the backend named in the configuration
pub fn open(config: &StoreConfig) -> StoreResult<Arc<dyn KeyValueStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Sled => {
            if let Some(parent) = config.path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Backend(format!("Failed to create store directory: {}", e)))?;
            }
            Ok(Arc::new(SledStore::open(&config.path)?))
        }
    }
}
