//! Cryptography module for sealnote
//!
//! Provides AES-256-CBC encryption with PBKDF2-HMAC key derivation and the
//! text blob format that carries salt, IV and ciphertext together.

mod codec;
mod encryption;
mod kdf;
mod keys;
mod random;

pub use codec::{decode, encode, CipherBlob};
pub use encryption::{decrypt, encrypt};
pub use kdf::{derive_key, DerivedKey, KdfHash, KdfParams};
pub use keys::MasterSessionKey;
pub use random::{random_bytes, EntropySource, OsEntropy};

/// Size of AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of the CBC initialization vector in bytes
pub const IV_SIZE: usize = 16;

/// Size of salt for key derivation
pub const SALT_SIZE: usize = 16;

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// PBKDF2 iteration floor. Raising it does not change the blob format.
pub const DEFAULT_KDF_ITERATIONS: u32 = 10_000;

/// Hex characters occupied by the salt segment of a blob
pub const SALT_HEX_LEN: usize = SALT_SIZE * 2;

/// Hex characters occupied by the IV segment of a blob
pub const IV_HEX_LEN: usize = IV_SIZE * 2;

/// Shortest string that can be split into salt and IV
pub const BLOB_HEADER_LEN: usize = SALT_HEX_LEN + IV_HEX_LEN;

/// Salt bytes
pub type Salt = [u8; SALT_SIZE];

/// Initialization vector bytes
pub type Iv = [u8; IV_SIZE];
