//! Error types for sealnote

use std::io;
use thiserror::Error;

/// Result type alias using our application-level Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Failure to split a blob into salt, IV and ciphertext
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Blob truncated: {len} characters, need at least {min}")]
    Truncated { len: usize, min: usize },

    #[error("Invalid hex in {field} segment")]
    InvalidHex { field: &'static str },
}

/// Errors raised by the cryptographic core
#[derive(Error, Debug)]
pub enum CipherError {
    #[error("Random source unavailable: {0}")]
    RandomSourceUnavailable(String),

    #[error("Invalid blob format: {0}")]
    Decode(#[from] DecodeError),

    /// Wrong password and corrupted ciphertext cannot be told apart without
    /// an authentication tag, so both land here.
    #[error("Invalid key or corrupt data")]
    InvalidKeyOrCorruptData,

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Internal cipher error: {0}")]
    Internal(String),
}

/// Errors raised by a key-value store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),

    #[error("Stored value is not valid UTF-8 for key {0}")]
    Serialization(String),

    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Errors raised by session vault operations
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("Vault cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("Vault store error: {0}")]
    Store(#[from] StoreError),

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Instance identifier unavailable, vault is disabled")]
    InstanceIdUnavailable,

    #[error("Corrupt vault record for {0}")]
    CorruptRecord(String),
}

/// Main error type for sealnote
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Store(#[from] StoreError),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CipherError {
    /// Message suitable for showing to the person at the keyboard
    pub fn user_message(&self) -> String {
        match self {
            CipherError::RandomSourceUnavailable(_) => {
                "Encryption failed: no secure random source is available.".to_string()
            }
            CipherError::Decode(_) => "Invalid format: this is not an encrypted message.".to_string(),
            CipherError::InvalidKeyOrCorruptData => {
                "Decryption failed. Please check your key and encrypted message.".to_string()
            }
            CipherError::PreconditionViolation(msg) => msg.clone(),
            CipherError::Internal(_) => {
                "Encryption failed. Please try again.".to_string()
            }
        }
    }
}

impl VaultError {
    /// Message suitable for showing to the person at the keyboard
    pub fn user_message(&self) -> String {
        match self {
            VaultError::Cipher(CipherError::InvalidKeyOrCorruptData) | VaultError::CorruptRecord(_) => {
                "Selected key not found or unable to decrypt.".to_string()
            }
            VaultError::Cipher(e) => e.user_message(),
            VaultError::Store(_) => "Failed to access stored keys.".to_string(),
            VaultError::PreconditionViolation(msg) => msg.clone(),
            VaultError::InstanceIdUnavailable => {
                "Stored keys are unavailable: no instance identifier. Run 'sealnote init'.".to_string()
            }
        }
    }
}

impl Error {
    /// Message suitable for showing to the person at the keyboard
    pub fn user_message(&self) -> String {
        match self {
            Error::Cipher(e) => e.user_message(),
            Error::Vault(e) => e.user_message(),
            Error::Store(_) => "Failed to access stored keys.".to_string(),
            other => other.to_string(),
        }
    }

    /// Process exit code for the command-line front end
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Cipher(CipherError::InvalidKeyOrCorruptData)
            | Error::Cipher(CipherError::Decode(_)) => 2,
            Error::Cipher(CipherError::PreconditionViolation(_))
            | Error::Vault(VaultError::PreconditionViolation(_)) => 3,
            Error::Config(_) | Error::InvalidConfig(_) => 4,
            _ => 1,
        }
    }
}
