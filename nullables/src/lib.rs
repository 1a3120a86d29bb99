//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator the shared random core consumes (clock, random
//! source, authority directory, state persistence) sits behind a trait.
//! This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod directory;
pub mod random;
pub mod store;

pub use clock::NullClock;
pub use directory::NullDirectory;
pub use random::NullRandom;
pub use store::NullStatePersister;
