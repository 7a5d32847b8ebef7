//! Text blob format: `hex(salt) ‖ hex(iv) ‖ ciphertext`
//!
//! Salt and IV are fixed at 32 hex characters each, so the split needs no
//! delimiter. The ciphertext segment is carried as-is; whether it decrypts
//! is the real integrity check.

use crate::crypto::{Iv, Salt, BLOB_HEADER_LEN, IV_HEX_LEN, SALT_HEX_LEN};
use crate::error::DecodeError;

/// A decoded blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherBlob {
    pub salt: Salt,
    pub iv: Iv,
    /// Ciphertext in the cipher's text encoding (base64)
    pub ciphertext: String,
}

impl CipherBlob {
    pub fn new(salt: Salt, iv: Iv, ciphertext: String) -> Self {
        Self { salt, iv, ciphertext }
    }

    /// Render back to the wire form
    pub fn encode(&self) -> String {
        encode(&self.salt, &self.iv, &self.ciphertext)
    }
}

impl std::str::FromStr for CipherBlob {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s)
    }
}

impl std::fmt::Display for CipherBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Concatenate salt, IV and ciphertext text into one blob
pub fn encode(salt: &Salt, iv: &Iv, ciphertext: &str) -> String {
    let mut out = String::with_capacity(BLOB_HEADER_LEN + ciphertext.len());
    out.push_str(&hex::encode(salt));
    out.push_str(&hex::encode(iv));
    out.push_str(ciphertext);
    out
}

/// Split a blob into salt, IV and ciphertext text
pub fn decode(blob: &str) -> Result<CipherBlob, DecodeError> {
    if blob.len() < BLOB_HEADER_LEN {
        return Err(DecodeError::Truncated {
            len: blob.len(),
            min: BLOB_HEADER_LEN,
        });
    }

    // Byte slicing below must land on char boundaries
    if !blob.is_char_boundary(SALT_HEX_LEN) {
        return Err(DecodeError::InvalidHex { field: "salt" });
    }
    if !blob.is_char_boundary(BLOB_HEADER_LEN) {
        return Err(DecodeError::InvalidHex { field: "iv" });
    }

    let (salt_hex, rest) = blob.split_at(SALT_HEX_LEN);
    let (iv_hex, ciphertext) = rest.split_at(IV_HEX_LEN);

    let mut salt = [0u8; SALT_HEX_LEN / 2];
    hex::decode_to_slice(salt_hex, &mut salt)
        .map_err(|_| DecodeError::InvalidHex { field: "salt" })?;

    let mut iv = [0u8; IV_HEX_LEN / 2];
    hex::decode_to_slice(iv_hex, &mut iv).map_err(|_| DecodeError::InvalidHex { field: "iv" })?;

    Ok(CipherBlob {
        salt,
        iv,
        ciphertext: ciphertext.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let blob = encode(&[0xab; 16], &[0x01; 16], "Zm9v");
        assert_eq!(blob.len(), 64 + 4);
        assert_eq!(&blob[..32], "ab".repeat(16));
        assert_eq!(&blob[32..64], "01".repeat(16));
        assert_eq!(&blob[64..], "Zm9v");
    }

    #[test]
    fn test_decode_returns_exact_parts() {
        let salt = [0x5a; 16];
        let iv = [0xc3; 16];
        let decoded = decode(&encode(&salt, &iv, "U2FsdGVk+/==")).unwrap();

        assert_eq!(decoded.salt, salt);
        assert_eq!(decoded.iv, iv);
        assert_eq!(decoded.ciphertext, "U2FsdGVk+/==");
    }

    #[test]
    fn test_decode_accepts_empty_ciphertext() {
        let decoded = decode(&"0".repeat(64)).unwrap();
        assert!(decoded.ciphertext.is_empty());
    }

    #[test]
    fn test_decode_accepts_uppercase_hex() {
        let decoded = decode(&format!("{}{}xyz", "AB".repeat(16), "CD".repeat(16))).unwrap();
        assert_eq!(decoded.salt, [0xab; 16]);
        assert_eq!(decoded.iv, [0xcd; 16]);
    }

    #[test]
    fn test_truncated() {
        let result = decode(&"a".repeat(63));
        assert_eq!(result, Err(DecodeError::Truncated { len: 63, min: 64 }));
        assert!(matches!(decode(""), Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn test_invalid_hex_fields() {
        let bad_salt = format!("{}{}", "zz".repeat(16), "00".repeat(16));
        assert_eq!(decode(&bad_salt), Err(DecodeError::InvalidHex { field: "salt" }));

        let bad_iv = format!("{}{}", "00".repeat(16), "0g".repeat(16));
        assert_eq!(decode(&bad_iv), Err(DecodeError::InvalidHex { field: "iv" }));
    }

    #[test]
    fn test_multibyte_input_does_not_panic() {
        let input = "é".repeat(40);
        assert!(decode(&input).is_err());
    }

    #[test]
    fn test_multibyte_char_straddling_iv_end() {
        // 63 ASCII bytes then a two-byte char covering bytes 63..65
        let input = format!("{}{}é{}", "00".repeat(16), "0".repeat(31), "QUJD");
        assert_eq!(decode(&input), Err(DecodeError::InvalidHex { field: "iv" }));

        let input = format!("{}é{}", "0".repeat(31), "0".repeat(40));
        assert_eq!(decode(&input), Err(DecodeError::InvalidHex { field: "salt" }));
    }

    #[test]
    fn test_ciphertext_text_kept_verbatim() {
        let blob = encode(&[1; 16], &[2; 16], " abcd \n");
        assert_eq!(decode(&blob).unwrap().ciphertext, " abcd \n");
    }

    #[test]
    fn test_from_str_and_display() {
        let blob: CipherBlob = encode(&[9; 16], &[8; 16], "QUJD").parse().unwrap();
        assert_eq!(blob.to_string(), encode(&[9; 16], &[8; 16], "QUJD"));
    }
}
