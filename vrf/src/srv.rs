//! Shared random value computation.
//!
//! At the end of a reveal phase every authority derives the next SRV from the
//! reveals it holds:
//!
//! ```text
//! HASHED_REVEALS = H(fpr_1 ‖ reveal_1 ‖ ... ‖ fpr_n ‖ reveal_n)
//! SRV = H("shared-random" ‖ INT_8(n) ‖ INT_4(version) ‖ HASHED_REVEALS ‖ PREV_SRV)
//! ```
//!
//! Reveals are ordered by their hashed reveal, a content-derived order that
//! does not depend on arrival order or on authority identity. `PREV_SRV` is
//! 32 zero bytes when there is no previous value.

use srand_crypto::{sha3_256, sha3_256_multi};
use srand_protocol::Commit;
use srand_types::{AuthorityDirectory, SharedRandomValue, SR_PROTO_VERSION};
use tracing::{debug, info, warn};

/// Invariant token prefixed to every SRV message.
pub const SRV_TOKEN: &[u8] = b"shared-random";

/// Derive the SRV for the protocol run that just ended.
///
/// Only commits from currently recognized authorities that carry a reveal
/// contribute. Without a single reveal there is no SRV for the run.
pub fn compute_srv<'a>(
    commits: impl IntoIterator<Item = &'a Commit>,
    previous: Option<&SharedRandomValue>,
    directory: &dyn AuthorityDirectory,
) -> Option<SharedRandomValue> {
    let mut revealed: Vec<&Commit> = commits
        .into_iter()
        .filter(|c| {
            if !directory.is_known_authority(c.authority_id()) {
                warn!(
                    authority = %c.authority_id(),
                    "not a recognized authority, discarding commit for the SRV computation"
                );
                return false;
            }
            c.has_reveal()
        })
        .collect();
    if revealed.is_empty() {
        info!("no reveals to compute a shared random value from");
        return None;
    }
    revealed.sort_by(|a, b| a.hashed_reveal().cmp(b.hashed_reveal()));

    let mut reveals = String::new();
    for commit in &revealed {
        if let Some(encoded) = commit.encoded_reveal() {
            reveals.push_str(&commit.authority_id().to_hex());
            reveals.push_str(encoded);
        }
    }
    let hashed_reveals = sha3_256(reveals.as_bytes());
    let num_reveals = revealed.len() as u64;

    let zero = [0u8; 32];
    let previous_value = previous.map(SharedRandomValue::value).unwrap_or(&zero);
    let value = sha3_256_multi(&[
        SRV_TOKEN,
        &num_reveals.to_be_bytes(),
        &SR_PROTO_VERSION.to_be_bytes(),
        &hashed_reveals,
        previous_value,
    ]);

    debug!(num_reveals, "computed shared random value");
    Some(SharedRandomValue::new(num_reveals, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use srand_crypto::{CryptoError, RandomSource};
    use srand_types::{AuthorityId, Timestamp};
    use std::collections::HashSet;

    const TS: u64 = 1_451_606_400;

    struct FixedRandom(u8);

    impl RandomSource for FixedRandom {
        fn fill_bytes(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
            buf.fill(self.0);
            Ok(())
        }
    }

    struct Directory(HashSet<AuthorityId>);

    impl AuthorityDirectory for Directory {
        fn my_identity(&self) -> AuthorityId {
            AuthorityId::new([0xAA; 20])
        }

        fn is_known_authority(&self, id: &AuthorityId) -> bool {
            self.0.contains(id)
        }

        fn n_authorities(&self) -> usize {
            self.0.len()
        }
    }

    fn directory(ids: &[u8]) -> Directory {
        Directory(ids.iter().map(|b| AuthorityId::new([*b; 20])).collect())
    }

    fn commit(id: u8, seed: u8) -> Commit {
        Commit::generate(Timestamp::new(TS), AuthorityId::new([id; 20]), &FixedRandom(seed))
            .unwrap()
    }

    fn fixture() -> Vec<Commit> {
        vec![commit(0xAA, 1), commit(0xBB, 2), commit(0xCC, 3)]
    }

    #[test]
    fn three_authority_vector() {
        let dir = directory(&[0xAA, 0xBB, 0xCC]);
        let srv = compute_srv(&fixture(), None, &dir).unwrap();
        assert_eq!(srv.num_reveals(), 3);
        assert_eq!(
            hex::encode(srv.value()),
            "9a1204f56ab4f0ad63b4242951ddec8e647b921d3db4f65dd293b49d590df02f"
        );
    }

    #[test]
    fn three_authority_vector_with_previous() {
        let dir = directory(&[0xAA, 0xBB, 0xCC]);
        let prev = SharedRandomValue::new(2, [0x42; 32]);
        let srv = compute_srv(&fixture(), Some(&prev), &dir).unwrap();
        assert_eq!(
            hex::encode(srv.value()),
            "e268cfb0c6906472041cb1d8321a0f3055a14db1293fbf3c2967f9473469f77b"
        );
    }

    #[test]
    fn commit_without_reveal_is_excluded() {
        let dir = directory(&[0xAA, 0xBB, 0xCC, 0xDD]);
        let mut commits = fixture();
        commits.push(commit(0xDD, 4).commitment_only());
        let srv = compute_srv(&commits, None, &dir).unwrap();
        assert_eq!(srv.num_reveals(), 3);
        assert_eq!(Some(srv), compute_srv(&fixture(), None, &dir));
    }

    #[test]
    fn unknown_authority_is_excluded() {
        let dir = directory(&[0xAA, 0xBB]);
        let srv = compute_srv(&fixture(), None, &dir).unwrap();
        assert_eq!(srv.num_reveals(), 2);
    }

    #[test]
    fn single_reveal_vector() {
        let dir = directory(&[0x01]);
        let srv = compute_srv(&[commit(0x01, 9)], None, &dir).unwrap();
        assert_eq!(srv.num_reveals(), 1);
        assert_eq!(
            hex::encode(srv.value()),
            "553ffb5aa77f0ebe7a03b4209db99bac35aa70c18c47f36d495a7bf5215f7bae"
        );
    }

    #[test]
    fn order_of_commits_does_not_matter() {
        let dir = directory(&[0xAA, 0xBB, 0xCC]);
        let mut reversed = fixture();
        reversed.reverse();
        assert_eq!(
            compute_srv(&fixture(), None, &dir),
            compute_srv(&reversed, None, &dir)
        );
    }

    #[test]
    fn no_reveals_no_srv() {
        let dir = directory(&[0xAA, 0xBB, 0xCC]);
        let unrevealed: Vec<Commit> = fixture().iter().map(Commit::commitment_only).collect();
        assert_eq!(compute_srv(&unrevealed, None, &dir), None);
        assert_eq!(compute_srv(&fixture(), None, &directory(&[0x01])), None);
    }
}
