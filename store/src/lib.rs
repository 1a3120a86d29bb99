//! Shared random protocol state.
//!
//! [`SharedRandState`] is the single owner of the protocol state. Every
//! mutation goes through one of its named methods and is followed by exactly
//! one flush: the disk mirror ([`DiskState`]) is rebuilt wholesale from memory
//! and handed to a [`StatePersister`]. The disk copy is only read at boot.

pub mod disk;
pub mod error;
pub mod persist;
pub mod state;

pub use disk::{DiskState, DEFAULT_STATE_FILE_NAME};
pub use error::StoreError;
pub use persist::{FileStatePersister, MemoryPersister, StatePersister};
pub use state::{ProtocolState, SharedRandState};
