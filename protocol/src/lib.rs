//! Shared random wire protocol.
//!
//! - [`codec`]: fixed-width binary payloads for commits and reveals and
//!   their base64 text form.
//! - [`commit`]: the commit/reveal value object and its binding check.
//! - [`lines`]: the `shared-rand-*` lines carried in votes and consensuses.
//! - [`version`]: protocol version and digest algorithm negotiation.

pub mod codec;
pub mod commit;
pub mod error;
pub mod lines;
pub mod version;

pub use commit::{commitments_equal, Commit, Reveal};
pub use error::ProtocolError;
pub use lines::{ConsensusSrvs, SrVoteInfo};
pub use version::DigestAlgorithm;
