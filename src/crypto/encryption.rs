//! AES-256-CBC Encryption Implementation
//!
//! Messages are encrypted with AES-256 in CBC mode with PKCS#7 padding.
//! There is no authentication tag: the padding check on decrypt is the
//! only integrity signal, and it cannot tell a wrong key from tampering.

use crate::crypto::{Iv, KEY_SIZE};
use crate::error::CipherError;
use aes::Aes256;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Encrypt data using AES-256-CBC with PKCS#7 padding
///
/// # Arguments
/// * `key` - 256-bit encryption key
/// * `iv` - 128-bit IV, never reused with the same key
/// * `plaintext` - Data to encrypt
///
/// # Returns
/// Ciphertext, a whole number of blocks
pub fn encrypt(key: &[u8; KEY_SIZE], iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256CbcEnc::new_from_slices(key, iv)
        .map_err(|_| CipherError::Internal("Failed to create encryption key".to_string()))?;

    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt data using AES-256-CBC with PKCS#7 padding
///
/// Fails with `InvalidKeyOrCorruptData` when the ciphertext is not a whole
/// number of blocks or the recovered padding is malformed.
pub fn decrypt(key: &[u8; KEY_SIZE], iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let cipher = Aes256CbcDec::new_from_slices(key, iv)
        .map_err(|_| CipherError::Internal("Failed to create decryption key".to_string()))?;

    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CipherError::InvalidKeyOrCorruptData)
}
