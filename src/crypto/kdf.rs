//! Key derivation: PBKDF2-HMAC password → 256-bit key

use crate::crypto::{Salt, DEFAULT_KDF_ITERATIONS, KEY_SIZE};
use crate::error::CipherError;
use ring::pbkdf2;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use zeroize::ZeroizeOnDrop;

/// HMAC hash used inside PBKDF2
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KdfHash {
    #[default]
    Sha256,
    /// For blobs produced by older tooling that defaulted to HMAC-SHA1
    Sha1,
}

impl KdfHash {
    fn algorithm(self) -> pbkdf2::Algorithm {
        match self {
            KdfHash::Sha256 => pbkdf2::PBKDF2_HMAC_SHA256,
            KdfHash::Sha1 => pbkdf2::PBKDF2_HMAC_SHA1,
        }
    }
}

/// PBKDF2 parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub iterations: NonZeroU32,
    pub hash: KdfHash,
}

impl KdfParams {
    pub fn new(iterations: NonZeroU32, hash: KdfHash) -> Self {
        Self { iterations, hash }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: NonZeroU32::new(DEFAULT_KDF_ITERATIONS).unwrap_or(NonZeroU32::MIN),
            hash: KdfHash::Sha256,
        }
    }
}

/// A 256-bit key derived from a password.
///
/// Zeroized on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_SIZE],
}

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }

    /// Lowercase hex of the key bytes, the form stored in vault records
    pub fn to_hex(&self) -> String {
        hex::encode(self.key)
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive a 256-bit key from a password and salt.
///
/// Same password, salt and params always give the same key. An empty
/// password is rejected so no key is ever produced from zero-length input.
pub fn derive_key(password: &[u8], salt: &Salt, params: &KdfParams) -> Result<DerivedKey, CipherError> {
    if password.is_empty() {
        return Err(CipherError::PreconditionViolation(
            "Password cannot be empty".to_string(),
        ));
    }

    let mut key = [0u8; KEY_SIZE];
    pbkdf2::derive(
        params.hash.algorithm(),
        params.iterations,
        salt,
        password,
        &mut key,
    );

    Ok(DerivedKey { key })
}
