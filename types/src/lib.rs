//! Fundamental types for the shared random protocol.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: authority identities, timestamps, the protocol phase, shared
//! random values, protocol constants, and the directory collaborator trait.

pub mod authority;
pub mod error;
pub mod params;
pub mod srv;
pub mod state;
pub mod time;

pub use authority::{AuthorityDirectory, AuthorityId};
pub use error::TypeError;
pub use params::{DIGEST_ALG_NAME, N_PHASES, ROUNDS_PER_PHASE, SR_PROTO_VERSION};
pub use srv::SharedRandomValue;
pub use state::Phase;
pub use time::{Clock, SystemClock, Timestamp};
