use thiserror::Error;

use srand_protocol::ProtocolError;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The disk state failed structural validation and must be discarded.
    #[error("shared random state is corrupt: {0}")]
    StateCorrupt(String),

    /// The state machine itself is wrong; not recoverable.
    #[error("internal invariant broken: {0}")]
    InvariantBroken(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}
