//! Secure random bytes for salts and IVs

use crate::error::CipherError;
use rand::rngs::OsRng;
use rand::RngCore;

/// A source of cryptographically secure randomness.
///
/// Implementations must fail rather than hand out predictable bytes.
pub trait EntropySource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), CipherError>;
}

/// Operating system RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), CipherError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| CipherError::RandomSourceUnavailable(e.to_string()))
    }
}

/// Generate `N` random bytes from the given source
pub fn random_bytes<const N: usize>(source: &dyn EntropySource) -> Result<[u8; N], CipherError> {
    let mut buf = [0u8; N];
    source.fill(&mut buf)?;
    Ok(buf)
}
