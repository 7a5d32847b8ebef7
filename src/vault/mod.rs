//! Session key vault
//!
//! Named secrets are reduced to PBKDF2-derived keys, encrypted under the
//! master session key, and kept in the store under a fixed prefix:
//!
//! ```text
//! secret ──PBKDF2(salt)──▶ hex(salt) ‖ hex(key) ──encrypt(master)──▶ store[prefix + name]
//! ```
//!
//! Loading hands back the derived key, never the secret.

mod record;

pub use record::{SessionSecretRecord, StoredKey, STORED_VALUE_LEN};

use std::sync::Arc;

use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::cipher::MessageCipher;
use crate::config::{Config, VaultConfig};
use crate::crypto::{self, MasterSessionKey, Salt};
use crate::error::VaultError;
use crate::store::KeyValueStore;

/// Everything vault operations need besides the store, built once at startup
#[derive(Debug)]
pub struct VaultContext {
    master: MasterSessionKey,
    cipher: MessageCipher,
    key_prefix: String,
    min_secret_length: usize,
}

impl VaultContext {
    /// Build a context; fails closed when the instance identifier is absent
    pub fn new(
        instance_id: Option<&str>,
        cipher: MessageCipher,
        config: &VaultConfig,
    ) -> Result<Self, VaultError> {
        if config.key_prefix.is_empty() {
            return Err(VaultError::PreconditionViolation(
                "Vault key prefix cannot be empty".to_string(),
            ));
        }

        Ok(VaultContext {
            master: MasterSessionKey::from_instance_id(instance_id)?,
            cipher,
            key_prefix: config.key_prefix.clone(),
            min_secret_length: config.min_secret_length,
        })
    }

    /// Build from application configuration
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let instance_id = config.resolve_instance_id()?;
        let cipher = MessageCipher::new(config.kdf.params()?);
        Ok(Self::new(instance_id.as_deref(), cipher, &config.vault)?)
    }

    pub fn cipher(&self) -> &MessageCipher {
        &self.cipher
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    fn store_key(&self, name: &str) -> String {
        format!("{}{}", self.key_prefix, name)
    }
}

/// Named derived keys persisted in an external store
#[derive(Clone)]
pub struct SessionKeyVault {
    store: Arc<dyn KeyValueStore>,
    ctx: Arc<VaultContext>,
}

impl SessionKeyVault {
    pub fn new(store: Arc<dyn KeyValueStore>, ctx: Arc<VaultContext>) -> Self {
        Self { store, ctx }
    }

    pub fn context(&self) -> &VaultContext {
        &self.ctx
    }

    /// Reduce a secret to a record holding a fresh salt and the derived key.
    ///
    /// The name is trimmed and must not be empty; the secret must meet the
    /// configured minimum length.
    pub fn wrap_secret_for_storage(
        &self,
        name: &str,
        secret: &str,
    ) -> Result<SessionSecretRecord, VaultError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(VaultError::PreconditionViolation(
                "Please enter a key name".to_string(),
            ));
        }

        if secret.chars().count() < self.ctx.min_secret_length {
            return Err(VaultError::PreconditionViolation(format!(
                "Key must be at least {} characters long",
                self.ctx.min_secret_length
            )));
        }

        let salt: Salt = crypto::random_bytes(self.ctx.cipher.entropy())?;
        let key = crypto::derive_key(secret.as_bytes(), &salt, self.ctx.cipher.params())?;

        let mut stored_value = hex::encode(salt);
        stored_value.push_str(&key.to_hex());

        Ok(SessionSecretRecord::new(name.to_string(), stored_value))
    }

    /// Encrypt a record's stored value under the master session key
    pub fn protect_record(&self, record: &SessionSecretRecord) -> Result<String, VaultError> {
        Ok(self
            .ctx
            .cipher
            .encrypt(record.stored_value(), self.ctx.master.as_password())?)
    }

    /// Recover a stored value from its protected form
    pub fn unprotect_record(&self, blob: &str) -> Result<Zeroizing<String>, VaultError> {
        let value = self.ctx.cipher.decrypt(blob, self.ctx.master.as_password())?;
        Ok(Zeroizing::new(value))
    }

    /// Wrap, protect and persist a secret under `name`, replacing any
    /// existing entry with that name
    pub async fn save(&self, name: &str, secret: &str) -> Result<(), VaultError> {
        let record = self.wrap_secret_for_storage(name, secret)?;
        let blob = self.protect_record(&record)?;

        self.store
            .set(vec![(self.ctx.store_key(&record.name), blob)])
            .await?;

        info!("Saved vault key '{}'", record.name);
        Ok(())
    }

    /// Load the derived key saved under `name`; `None` if there is none
    pub async fn load(&self, name: &str) -> Result<Option<StoredKey>, VaultError> {
        let name = name.trim();
        let Some(blob) = self.store.get(&self.ctx.store_key(name)).await? else {
            debug!("No vault key named '{}'", name);
            return Ok(None);
        };

        let stored_value = self.unprotect_record(&blob)?;
        let key = StoredKey::parse(name, &stored_value)?;

        debug!("Loaded vault key '{}'", name);
        Ok(Some(key))
    }

    /// Names of all vault entries, in store iteration order
    pub async fn list_names(&self) -> Result<Vec<String>, VaultError> {
        let prefix = self.ctx.key_prefix();
        Ok(self
            .store
            .keys()
            .await?
            .into_iter()
            .filter_map(|key| key.strip_prefix(prefix).map(str::to_string))
            .collect())
    }

    /// Wipe the whole store, vault and non-vault entries alike
    pub async fn clear_all(&self) -> Result<(), VaultError> {
        self.store.clear().await?;
        info!("All stored keys have been cleared");
        Ok(())
    }

    /// Remove every store entry outside the vault prefix, leaving vault
    /// records in place. Returns how many entries were removed.
    pub async fn purge_non_vault_entries(&self) -> Result<usize, VaultError> {
        let prefix = self.ctx.key_prefix();
        let doomed: Vec<String> = self
            .store
            .keys()
            .await?
            .into_iter()
            .filter(|key| !key.starts_with(prefix))
            .collect();

        if !doomed.is_empty() {
            self.store.remove(&doomed).await?;
            warn!("Removed {} non-key entries from the store", doomed.len());
        }

        Ok(doomed.len())
    }
}
