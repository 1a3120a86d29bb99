use thiserror::Error;

use srand_crypto::CryptoError;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A base64 blob or a line field does not have the expected shape.
    #[error("malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("unsupported protocol version or digest algorithm: {0}")]
    UnsupportedVersionOrAlgorithm(String),

    /// A reveal does not match the commitment it claims to open.
    #[error("reveal from {authority} does not match its commitment: {reason}")]
    BindingViolation { authority: String, reason: String },

    #[error("random source failed: {0}")]
    Random(#[from] CryptoError),
}
