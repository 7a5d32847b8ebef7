//! Password-based message encryption
//!
//! Ties the pieces together: fresh salt and IV, PBKDF2 key, AES-256-CBC,
//! and the text blob format.
//!
//! Callers are expected to have enforced the minimum password length
//! (see [`crate::passphrase::validate_password`]) before getting here; this
//! layer only refuses empty inputs.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::debug;

use crate::crypto::{self, CipherBlob, EntropySource, Iv, KdfParams, OsEntropy, Salt};
use crate::error::CipherError;

/// Encrypts and decrypts text messages under a password
#[derive(Clone)]
pub struct MessageCipher {
    params: KdfParams,
    entropy: Arc<dyn EntropySource>,
}

impl MessageCipher {
    /// Cipher backed by the operating system RNG
    pub fn new(params: KdfParams) -> Self {
        Self::with_entropy(params, Arc::new(OsEntropy))
    }

    /// Cipher drawing salts and IVs from a caller-supplied source
    pub fn with_entropy(params: KdfParams, entropy: Arc<dyn EntropySource>) -> Self {
        Self { params, entropy }
    }

    pub fn params(&self) -> &KdfParams {
        &self.params
    }

    /// Source of salts and IVs
    pub fn entropy(&self) -> &dyn EntropySource {
        self.entropy.as_ref()
    }

    /// Encrypt `plaintext` under `password`, returning the wire blob.
    ///
    /// Every call draws a new salt and IV, so identical inputs never give
    /// identical blobs.
    pub fn encrypt(&self, plaintext: &str, password: &str) -> Result<String, CipherError> {
        if plaintext.is_empty() {
            return Err(CipherError::PreconditionViolation(
                "Message cannot be empty".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(CipherError::PreconditionViolation(
                "Password cannot be empty".to_string(),
            ));
        }

        let salt: Salt = crypto::random_bytes(self.entropy.as_ref())?;
        let iv: Iv = crypto::random_bytes(self.entropy.as_ref())?;
        let key = crypto::derive_key(password.as_bytes(), &salt, &self.params)?;

        let ciphertext = crypto::encrypt(key.as_bytes(), &iv, plaintext.as_bytes())?;
        let blob = CipherBlob::new(salt, iv, STANDARD.encode(ciphertext));

        debug!(
            "Encrypted {} bytes, iterations={}",
            plaintext.len(),
            self.params.iterations
        );
        Ok(blob.encode())
    }

    /// Decrypt a wire blob with `password`.
    ///
    /// Malformed salt/IV surfaces as `CipherError::Decode`. Anything wrong
    /// past that point, whether a bad password or damaged ciphertext, is
    /// reported as `InvalidKeyOrCorruptData`.
    pub fn decrypt(&self, blob: &str, password: &str) -> Result<String, CipherError> {
        if password.is_empty() {
            return Err(CipherError::PreconditionViolation(
                "Password cannot be empty".to_string(),
            ));
        }

        let blob = crypto::decode(blob)?;
        let key = crypto::derive_key(password.as_bytes(), &blob.salt, &self.params)?;

        let ciphertext = STANDARD
            .decode(blob.ciphertext.as_bytes())
            .map_err(|_| CipherError::InvalidKeyOrCorruptData)?;

        let plaintext = crypto::decrypt(key.as_bytes(), &blob.iv, &ciphertext)?;
        let message =
            String::from_utf8(plaintext).map_err(|_| CipherError::InvalidKeyOrCorruptData)?;

        if message.is_empty() {
            return Err(CipherError::InvalidKeyOrCorruptData);
        }

        debug!("Decrypted {} bytes", message.len());
        Ok(message)
    }
}

impl Default for MessageCipher {
    fn default() -> Self {
        Self::new(KdfParams::default())
    }
}

impl std::fmt::Debug for MessageCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageCipher")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KdfHash, BLOB_HEADER_LEN};
    use crate::error::DecodeError;
    use std::num::NonZeroU32;

    fn fast_cipher() -> MessageCipher {
        MessageCipher::new(KdfParams::new(NonZeroU32::new(50).unwrap(), KdfHash::Sha256))
    }

    struct Exhausted;

    impl EntropySource for Exhausted {
        fn fill(&self, _dest: &mut [u8]) -> Result<(), CipherError> {
            Err(CipherError::RandomSourceUnavailable("no entropy".to_string()))
        }
    }

    /// Deterministic source so tampering tests are reproducible
    struct Counter(std::sync::atomic::AtomicU8);

    impl EntropySource for Counter {
        fn fill(&self, dest: &mut [u8]) -> Result<(), CipherError> {
            let base = self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            for (i, b) in dest.iter_mut().enumerate() {
                *b = base.wrapping_mul(31).wrapping_add(i as u8);
            }
            Ok(())
        }
    }

    #[test]
    fn test_hello_world_scenario() {
        let cipher = MessageCipher::default();
        let blob = cipher.encrypt("hello world", "Sup3rSecret!").unwrap();

        // 11 bytes pad to one block, 24 base64 characters
        assert_eq!(blob.len(), BLOB_HEADER_LEN + 24);
        assert_eq!(cipher.decrypt(&blob, "Sup3rSecret!").unwrap(), "hello world");
        assert!(matches!(
            cipher.decrypt(&blob, "wrongpassword"),
            Err(CipherError::InvalidKeyOrCorruptData)
        ));
    }

    #[test]
    fn test_round_trip_various_messages() {
        let cipher = fast_cipher();
        let long = "long message ".repeat(200);
        let messages: [&str; 5] = [
            "a",
            "exactly sixteen!",
            "multi\nline\nmessage",
            "unicode: héllo wörld ✓ 🔐",
            long.as_str(),
        ];

        for message in messages {
            let blob = cipher.encrypt(message, "password123").unwrap();
            assert_eq!(cipher.decrypt(&blob, "password123").unwrap(), message);
        }
    }

    #[test]
    fn test_encryption_is_not_deterministic() {
        let cipher = fast_cipher();
        let a = cipher.encrypt("same message", "same password").unwrap();
        let b = cipher.encrypt("same message", "same password").unwrap();

        assert_ne!(a, b);
        assert_ne!(a[..32], b[..32], "salt must differ");
        assert_ne!(a[32..64], b[32..64], "iv must differ");
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let cipher = MessageCipher::with_entropy(
            *fast_cipher().params(),
            Arc::new(Counter(Default::default())),
        );
        let blob = cipher.encrypt("hello world", "Sup3rSecret!").unwrap();

        for pos in BLOB_HEADER_LEN..blob.len() {
            let mut bytes = blob.clone().into_bytes();
            bytes[pos] = if bytes[pos] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            assert!(
                matches!(
                    cipher.decrypt(&tampered, "Sup3rSecret!"),
                    Err(CipherError::InvalidKeyOrCorruptData)
                ),
                "tampering at {} went unnoticed",
                pos
            );
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let cipher = fast_cipher();
        for i in 0..20 {
            let blob = cipher.encrypt("attack at dawn", "correct-horse").unwrap();
            let result = cipher.decrypt(&blob, &format!("wrong-horse-{}", i));
            assert!(matches!(result, Err(CipherError::InvalidKeyOrCorruptData)));
        }
    }

    #[test]
    fn test_truncated_blob_is_decode_error() {
        let cipher = fast_cipher();
        let result = cipher.decrypt("deadbeef", "password123");

        assert!(matches!(
            result,
            Err(CipherError::Decode(DecodeError::Truncated { len: 8, .. }))
        ));
    }

    #[test]
    fn test_header_only_blob_fails() {
        let cipher = fast_cipher();
        let result = cipher.decrypt(&"0".repeat(64), "password123");
        assert!(matches!(result, Err(CipherError::InvalidKeyOrCorruptData)));
    }

    #[test]
    fn test_empty_recovered_message_fails() {
        let cipher = fast_cipher();
        let salt = [3u8; 16];
        let iv = [4u8; 16];
        let key = crypto::derive_key(b"password123", &salt, cipher.params()).unwrap();

        // A single padding block decrypts cleanly to zero bytes
        let ciphertext = crypto::encrypt(key.as_bytes(), &iv, b"").unwrap();
        let blob = crypto::encode(&salt, &iv, &STANDARD.encode(ciphertext));

        assert!(matches!(
            cipher.decrypt(&blob, "password123"),
            Err(CipherError::InvalidKeyOrCorruptData)
        ));
    }

    #[test]
    fn test_non_base64_ciphertext_fails() {
        let cipher = fast_cipher();
        let blob = format!("{}{}", "0".repeat(64), "not base64!!");
        assert!(matches!(
            cipher.decrypt(&blob, "password123"),
            Err(CipherError::InvalidKeyOrCorruptData)
        ));
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let cipher = fast_cipher();

        assert!(matches!(
            cipher.encrypt("", "password123"),
            Err(CipherError::PreconditionViolation(_))
        ));
        assert!(matches!(
            cipher.encrypt("message", ""),
            Err(CipherError::PreconditionViolation(_))
        ));
        assert!(matches!(
            cipher.decrypt(&"0".repeat(88), ""),
            Err(CipherError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn test_random_source_failure_produces_no_blob() {
        let cipher = MessageCipher::with_entropy(*fast_cipher().params(), Arc::new(Exhausted));
        let result = cipher.encrypt("message", "password123");

        assert!(matches!(result, Err(CipherError::RandomSourceUnavailable(_))));
    }

    #[test]
    fn test_params_must_match() {
        let blob = fast_cipher().encrypt("message", "password123").unwrap();
        let other = MessageCipher::new(KdfParams::new(NonZeroU32::new(51).unwrap(), KdfHash::Sha256));

        assert!(other.decrypt(&blob, "password123").is_err());
    }
}
