//! Shared randomness derivation.
//!
//! - [`clock`]: pure functions mapping wall-clock time onto rounds, phases
//!   and protocol runs.
//! - [`srv`]: derivation of the shared random value from the reveals of a
//!   finished protocol run.
//!
//! Downstream services read the agreed values through [`SrvProvider`].

pub mod clock;
pub mod srv;

pub use clock::ProtocolClock;
pub use srv::{compute_srv, SRV_TOKEN};

use srand_types::SharedRandomValue;

/// Read access to the shared random values currently in force.
pub trait SrvProvider {
    /// The SRV produced by the most recent protocol run.
    fn current_srv(&self) -> Option<SharedRandomValue>;

    /// The SRV of the run before that.
    fn previous_srv(&self) -> Option<SharedRandomValue>;

    /// Human-readable name of this provider.
    fn name(&self) -> &str;
}
