//! In-process store, gone when the process exits

use super::{KeyValueStore, StoreResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

/// HashMap-backed store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn get_all(&self) -> StoreResult<Vec<(String, String)>> {
        Ok(self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }

    async fn set(&self, entries: Vec<(String, String)>) -> StoreResult<()> {
        self.entries.write().extend(entries);
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> StoreResult<()> {
        let mut entries = self.entries.write();
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.entries.write().clear();
        Ok(())
    }
}
