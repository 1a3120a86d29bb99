//! Errors raised when parsing fundamental types from text.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid authority fingerprint: {0}")]
    InvalidAuthorityId(String),

    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid phase: {0}")]
    InvalidPhase(String),
}
