//! Protocol constants.

/// Version of the shared random protocol spoken by this implementation.
pub const SR_PROTO_VERSION: u32 = 1;

/// Textual name of the only supported digest algorithm.
pub const DIGEST_ALG_NAME: &str = "sha3-256";

/// Number of voting rounds in each phase.
pub const ROUNDS_PER_PHASE: u64 = 12;

/// Number of phases in a protocol run (commit, reveal).
pub const N_PHASES: u64 = 2;
