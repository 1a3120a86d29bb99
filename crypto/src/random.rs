//! Sources of cryptographically secure randomness.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("random source unavailable: {0}")]
    RandomUnavailable(String),
}

/// Fills buffers with random bytes.
///
/// Production code uses [`OsRandom`]; tests plug in a deterministic source.
pub trait RandomSource {
    fn fill_bytes(&self, buf: &mut [u8]) -> Result<(), CryptoError>;
}

/// Randomness from the operating system's CSPRNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        getrandom::getrandom(buf).map_err(|e| CryptoError::RandomUnavailable(e.to_string()))
    }
}
