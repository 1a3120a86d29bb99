//! Cryptographic primitives for the shared random protocol.
//!
//! - **SHA3-256** for commitments, reveals and SRV derivation
//! - **OS randomness** behind the [`RandomSource`] trait so tests can swap in
//!   deterministic values

pub mod hash;
pub mod random;

pub use hash::{sha3_256, sha3_256_multi, DIGEST256_LEN};
pub use random::{CryptoError, OsRandom, RandomSource};
