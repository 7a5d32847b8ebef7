//! Sled-based store
//!
//! Values are written as given; the vault encrypts its records before they
//! get here. Everything else in the tree belongs to the application.

use super::{KeyValueStore, StoreResult};
use crate::error::StoreError;
use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use tracing::{debug, info};

/// On-disk store using sled
pub struct SledStore {
    db: Db,
}

impl SledStore {
    /// Open or create a store
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let db = sled::open(path.as_ref())?;
        info!("Store opened at {:?}, {} entries", path.as_ref(), db.len());
        Ok(SledStore { db })
    }

    /// Create an in-memory store (for testing)
    pub fn temporary() -> StoreResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(SledStore { db })
    }

    fn decode_value(key: &[u8], value: &[u8]) -> StoreResult<String> {
        String::from_utf8(value.to_vec())
            .map_err(|_| StoreError::Serialization(String::from_utf8_lossy(key).into_owned()))
    }
}

#[async_trait]
impl KeyValueStore for SledStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match self.db.get(key.as_bytes())? {
            Some(value) => Ok(Some(Self::decode_value(key.as_bytes(), &value)?)),
            None => Ok(None),
        }
    }

    async fn get_all(&self) -> StoreResult<Vec<(String, String)>> {
        let mut entries = Vec::new();
        for item in self.db.iter() {
            let (key, value) = item?;
            let key_str = String::from_utf8(key.to_vec())
                .map_err(|_| StoreError::Serialization(String::from_utf8_lossy(&key).into_owned()))?;
            entries.push((key_str, Self::decode_value(&key, &value)?));
        }
        Ok(entries)
    }

    async fn set(&self, entries: Vec<(String, String)>) -> StoreResult<()> {
        let mut batch = sled::Batch::default();
        for (key, value) in &entries {
            batch.insert(key.as_bytes(), value.as_bytes());
        }
        self.db.apply_batch(batch)?;
        self.db.flush()?;
        debug!("Stored {} entries", entries.len());
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> StoreResult<()> {
        let mut batch = sled::Batch::default();
        for key in keys {
            batch.remove(key.as_bytes());
        }
        self.db.apply_batch(batch)?;
        self.db.flush()?;
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.db.clear()?;
        self.db.flush()?;
        info!("Store cleared");
        Ok(())
    }
}
