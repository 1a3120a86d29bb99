//! Nullable authority directory: a fixed, in-memory list of authorities.

use srand_types::{AuthorityDirectory, AuthorityId};
use std::collections::BTreeSet;

/// The authority set as seen by one authority.
#[derive(Clone, Debug)]
pub struct NullDirectory {
    me: AuthorityId,
    known: BTreeSet<AuthorityId>,
}

impl NullDirectory {
    /// A directory in which `me` is the only authority.
    pub fn solo(me: AuthorityId) -> Self {
        Self::new(me, [])
    }

    /// A directory made of `me` plus `others`.
    pub fn new(me: AuthorityId, others: impl IntoIterator<Item = AuthorityId>) -> Self {
        let mut known: BTreeSet<AuthorityId> = others.into_iter().collect();
        known.insert(me);
        Self { me, known }
    }

    /// `n` authorities with ids `[1; 20]`, `[2; 20]`, ... seen from the
    /// first of them.
    pub fn numbered(n: u8) -> Self {
        let ids: Vec<AuthorityId> = (1..=n.max(1)).map(|b| AuthorityId::new([b; 20])).collect();
        Self::new(ids[0], ids)
    }

    /// The same authority set seen from `me`.
    pub fn as_seen_by(&self, me: AuthorityId) -> Self {
        Self::new(me, self.known.iter().copied())
    }

    pub fn add(&mut self, id: AuthorityId) {
        self.known.insert(id);
    }

    pub fn remove(&mut self, id: &AuthorityId) {
        self.known.remove(id);
    }

    pub fn authorities(&self) -> impl Iterator<Item = &AuthorityId> {
        self.known.iter()
    }
}

impl AuthorityDirectory for NullDirectory {
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
