//! sealnote - Password-based message encryption
//!
//! This library encrypts short text messages under a password
//! (PBKDF2 + AES-256-CBC, emitted as a portable text blob) and keeps a
//! vault of named derived keys, protected by a per-installation master
//! session key, in a local key-value store.

pub mod cipher;
pub mod config;
pub mod crypto;
pub mod error;
pub mod passphrase;
pub mod store;
pub mod vault;

pub use cipher::MessageCipher;
pub use config::Config;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cipher::MessageCipher;
    pub use crate::config::Config;
    pub use crate::error::{CipherError, Error, Result, VaultError};
    pub use crate::passphrase::{validate_password, Strength};
    pub use crate::store::KeyValueStore;
    pub use crate::vault::{SessionKeyVault, StoredKey, VaultContext};
}
