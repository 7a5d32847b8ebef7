//! Vault record layout
//!
//! A record's stored value is `hex(salt) ‖ hex(derived_key)`. The secret that
//! produced the key is never kept.

use crate::crypto::{Salt, KEY_SIZE, SALT_HEX_LEN};
use crate::error::VaultError;
use zeroize::Zeroizing;

/// Hex length of a well-formed stored value
pub const STORED_VALUE_LEN: usize = SALT_HEX_LEN + KEY_SIZE * 2;

/// A named secret, reduced to its derived key
pub struct SessionSecretRecord {
    pub name: String,
    stored_value: Zeroizing<String>,
}

impl SessionSecretRecord {
    pub(crate) fn new(name: String, stored_value: String) -> Self {
        Self {
            name,
            stored_value: Zeroizing::new(stored_value),
        }
    }

    /// The opaque `salt ‖ key` string that gets protected and persisted
    pub fn stored_value(&self) -> &str {
        &self.stored_value
    }
}

impl std::fmt::Debug for SessionSecretRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSecretRecord")
            .field("name", &self.name)
            .field("stored_value", &"[REDACTED]")
            .finish()
    }
}

/// Key material recovered from a vault record
pub struct StoredKey {
    salt: Salt,
    derived_key_hex: Zeroizing<String>,
}

impl StoredKey {
    /// Split a stored value back into salt and derived key
    pub fn parse(name: &str, stored_value: &str) -> Result<Self, VaultError> {
        let corrupt = || VaultError::CorruptRecord(name.to_string());

        if stored_value.len() != STORED_VALUE_LEN || !stored_value.is_ascii() {
            return Err(corrupt());
        }

        let (salt_hex, key_hex) = stored_value.split_at(SALT_HEX_LEN);

        let mut salt = [0u8; SALT_HEX_LEN / 2];
        hex::decode_to_slice(salt_hex, &mut salt).map_err(|_| corrupt())?;

        if !key_hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(corrupt());
        }

        Ok(StoredKey {
            salt,
            derived_key_hex: Zeroizing::new(key_hex.to_ascii_lowercase()),
        })
    }

    pub fn salt(&self) -> &Salt {
        &self.salt
    }

    /// Hex of the derived key; this is what stands in for the password when
    /// encrypting or decrypting with a saved key
    pub fn derived_key_hex(&self) -> &str {
        &self.derived_key_hex
    }
}

impl std::fmt::Debug for StoredKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredKey")
            .field("salt", &hex::encode(self.salt))
            .field("derived_key_hex", &"[REDACTED]")
            .finish()
    }
}
