//! Protocol version and digest algorithm negotiation.

use srand_types::{DIGEST_ALG_NAME, SR_PROTO_VERSION};

use crate::ProtocolError;

/// Check whether a commit created under `version` can be processed.
pub fn is_compatible(version: u32) -> bool {
    version >= 1 && version <= SR_PROTO_VERSION
}

/// Parse a version field, rejecting anything we cannot process.
pub fn parse_version(field: &str) -> Result<u32, ProtocolError> {
    let version: u32 = field.parse().map_err(|_| {
        ProtocolError::UnsupportedVersionOrAlgorithm(format!("version {field:?}"))
    })?;
    if !is_compatible(version) {
        return Err(ProtocolError::UnsupportedVersionOrAlgorithm(format!(
            "version {version}"
        )));
    }
    Ok(version)
}

/// The digest algorithms a commit may be bound with. Only one is supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    Sha3_256,
}

impl DigestAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha3_256 => DIGEST_ALG_NAME,
        }
    }

    pub fn parse(name: &str) -> Result<Self, ProtocolError> {
        if name == DIGEST_ALG_NAME {
            Ok(Self::Sha3_256)
        } else {
            Err(ProtocolError::UnsupportedVersionOrAlgorithm(format!(
                "algorithm {name:?}"
            )))
        }
    }
}
