use thiserror::Error;

use srand_protocol::ProtocolError;

/// Why a commit from a vote was not merged into our state.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("commit for {authority} carried by the vote of {voter}")]
    NotAuthoritative { voter: String, authority: String },

    #[error("{0} is not a recognized authority")]
    UnknownAuthority(String),

    #[error("already hold a commit from {0}")]
    AlreadyCommitted(String),

    #[error("commitment from {0} differs from the one we hold")]
    CommitmentChanged(String),

    #[error("commit from {0} carries a reveal during the commit phase")]
    EarlyReveal(String),

    #[error("no commit held for {0}, reveal ignored")]
    NoSavedCommit(String),

    #[error("already hold the reveal of {0}")]
    AlreadyRevealed(String),

    #[error("commit from {0} carries no reveal during the reveal phase")]
    MissingReveal(String),

    #[error(transparent)]
    Binding(#[from] ProtocolError),
}
