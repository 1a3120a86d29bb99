//! Agreement between authorities on commits and shared random values.
//!
//! - [`admission`]: which commits and reveals from a peer's vote are merged
//!   into our state.
//! - [`majority`]: which SRV the authorities agree on when building a
//!   consensus.
//! - [`error`]: the reasons a commit is turned away.

pub mod admission;
pub mod error;
pub mod majority;

pub use admission::{admit, should_keep};
pub use error::AdmissionError;
pub use majority::{
    consensus_srvs, default_agreement_threshold, majority_srv, required_agreements,
};
