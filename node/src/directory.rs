//! Authority directory built from configuration.

use std::collections::BTreeSet;

use srand_types::{AuthorityDirectory, AuthorityId};

use crate::{NodeConfig, NodeError};

/// A fixed set of recognized authorities, including ourselves.
#[derive(Clone, Debug)]
pub struct StaticDirectory {
    me: AuthorityId,
    known: BTreeSet<AuthorityId>,
}

impl StaticDirectory {
    pub fn new(me: AuthorityId, authorities: impl IntoIterator<Item = AuthorityId>) -> Self {
        let mut known: BTreeSet<AuthorityId> = authorities.into_iter().collect();
        known.insert(me);
        Self { me, known }
    }

    /// Read `identity` and `authorities` from the configuration.
    pub fn from_config(config: &NodeConfig) -> Result<Self, NodeError> {
        let identity = config
            .identity
            .as_deref()
            .ok_or_else(|| NodeError::Config("no authority identity configured".into()))?;
        let me = parse_fingerprint(identity)?;
        let authorities = config
            .authorities
            .iter()
            .map(|fpr| parse_fingerprint(fpr))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(me, authorities))
    }
}

fn parse_fingerprint(s: &str) -> Result<AuthorityId, NodeError> {
    AuthorityId::from_hex(s.trim()).map_err(|e| NodeError::Identity(e.to_string()))
}

impl AuthorityDirectory for StaticDirectory {
    fn my_identity(&self) -> AuthorityId {
        self.me
    }

    fn is_known_authority(&self, id: &AuthorityId) -> bool {
        self.known.contains(id)
    }

    fn n_authorities(&self) -> usize {
        self.known.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_from_config() {
        let config = NodeConfig {
            identity: Some("aa".repeat(20)),
            authorities: vec!["BB".repeat(20), "cc".repeat(20)],
            ..NodeConfig::default()
        };
        let dir = StaticDirectory::from_config(&config).unwrap();
        assert_eq!(dir.my_identity(), AuthorityId::new([0xAA; 20]));
        assert_eq!(dir.n_authorities(), 3);
        assert!(dir.is_known_authority(&AuthorityId::new([0xBB; 20])));
    }

    #[test]
    fn identity_is_required() {
        assert!(matches!(
            StaticDirectory::from_config(&NodeConfig::default()),
            Err(NodeError::Config(_))
        ));
    }

    #[test]
    fn bad_fingerprint_is_rejected() {
        let config = NodeConfig {
            identity: Some("aa".repeat(20)),
            authorities: vec!["not-hex".into()],
            ..NodeConfig::default()
        };
        assert!(matches!(
            StaticDirectory::from_config(&config),
            Err(NodeError::Identity(_))
        ));
    }
}
