//! Directory authority identities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// The 20-byte RSA identity digest of a directory authority.
///
/// Rendered as 40 uppercase hex characters (the authority "fingerprint").
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AuthorityId([u8; 20]);

impl AuthorityId {
    /// Length of the identity digest in bytes.
    pub const LEN: usize = 20;

    /// Length of the hex fingerprint.
    pub const HEX_LEN: usize = 40;

    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Uppercase hex fingerprint, the form used on the wire and on disk.
    pub fn to_hex(&self) -> String {
        hex::encode_upper(self.0)
    }

    /// Parse a 40-character hex fingerprint (either case).
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != Self::HEX_LEN {
            return Err(TypeError::InvalidAuthorityId(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| TypeError::InvalidAuthorityId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for AuthorityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthorityId({})", hex::encode_upper(&self.0[..4]))
    }
}

impl fmt::Display for AuthorityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for AuthorityId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// The directory collaborator: who we are and who the other authorities are.
///
/// Certificate handling lives outside this workspace; the protocol only needs
/// our own identity digest and membership checks for peers.
pub trait AuthorityDirectory {
    /// Identity digest of the authority running this process.
    fn my_identity(&self) -> AuthorityId;

    /// Whether `id` belongs to a currently recognized authority.
    fn is_known_authority(&self, id: &AuthorityId) -> bool;

    /// Number of recognized authorities (the majority denominator).
    fn n_authorities(&self) -> usize;
}
