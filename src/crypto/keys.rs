//! Master session key
//!
//! The key that protects vault records before they reach the store. It is
//! derived from a stable per-install identifier, so every run of the same
//! install regenerates the same key without persisting it.

use crate::error::VaultError;
use ring::digest::{digest, SHA256};
use zeroize::Zeroizing;

/// Password used to encrypt vault records: `hex(SHA-256(instance_id))`
pub struct MasterSessionKey {
    password: Zeroizing<String>,
}

impl MasterSessionKey {
    /// Derive from the instance identifier.
    ///
    /// Refuses to produce a key when the identifier is missing or blank; the
    /// vault must not fall back to a null key.
    pub fn from_instance_id(instance_id: Option<&str>) -> Result<Self, VaultError> {
        let id = instance_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(VaultError::InstanceIdUnavailable)?;

        let hash = digest(&SHA256, id.as_bytes());

        Ok(MasterSessionKey {
            password: Zeroizing::new(hex::encode(hash.as_ref())),
        })
    }

    /// The password form fed to the message cipher
    pub fn as_password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for MasterSessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSessionKey")
            .field("password", &"[REDACTED]")
            .finish()
    }
}
