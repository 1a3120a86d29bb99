//! Nullable random: deterministic bytes in place of the OS generator.

use srand_crypto::{CryptoError, RandomSource};
use std::sync::Mutex;

/// A deterministic random source for testing.
///
/// Each call fills the buffer from the next pre-configured value, cycling
/// through them in order.
pub struct NullRandom {
    outputs: Vec<[u8; 32]>,
    index: Mutex<usize>,
}

impl NullRandom {
    /// Create with a sequence of deterministic random values.
    pub fn new(outputs: Vec<[u8; 32]>) -> Self {
        Self {
            outputs,
            index: Mutex::new(0),
        }
    }

    /// Create with a single value that will be returned for every call.
    pub fn constant(value: [u8; 32]) -> Self {
        Self::new(vec![value])
    }

    /// A generator that always fails, as if the OS had no entropy.
    pub fn unavailable() -> Self {
        Self::new(Vec::new())
    }

    /// How many values have been drawn so far.
    pub fn draws(&self) -> usize {
        *self.index.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl RandomSource for NullRandom {
    fn fill_bytes(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        if self.outputs.is_empty() {
            return Err(CryptoError::RandomUnavailable("null random has no outputs".into()));
        }
        let mut idx = self
            .index
            .lock()
            .map_err(|e| CryptoError::RandomUnavailable(e.to_string()))?;
        let value = &self.outputs[*idx % self.outputs.len()];
        *idx += 1;
        for (i, b) in buf.iter_mut().enumerate() {
            *b = value[i % value.len()];
        }
        Ok(())
    }
}
