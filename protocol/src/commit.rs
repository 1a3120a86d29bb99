//! The commit/reveal value object.
//!
//! An authority binds itself to a random number during the commit phase by
//! publishing `base64(ts ‖ H(encoded_reveal))`, and opens that binding in the
//! reveal phase by publishing `encoded_reveal = base64(ts ‖ random_number)`.
//! [`Commit::verify_commit_and_reveal`] is the check that stops an authority
//! from changing its contribution after seeing the reveals of others.

use srand_crypto::{sha3_256, RandomSource};
use srand_types::{AuthorityId, Timestamp};
use tracing::{debug, warn};

use crate::codec::{self, RANDOM_NUMBER_LEN};
use crate::{DigestAlgorithm, ProtocolError};

/// The opened half of a commitment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reveal {
    reveal_ts: Timestamp,
    random_number: [u8; 32],
    encoded_reveal: String,
}

impl Reveal {
    /// Decode a reveal from its base64 form.
    pub fn decode(encoded: &str) -> Result<Self, ProtocolError> {
        let (reveal_ts, random_number) = codec::decode_reveal(encoded)?;
        Ok(Self {
            reveal_ts,
            random_number,
            encoded_reveal: encoded.to_string(),
        })
    }

    pub fn reveal_ts(&self) -> Timestamp {
        self.reveal_ts
    }

    pub fn random_number(&self) -> &[u8; 32] {
        &self.random_number
    }

    pub fn encoded(&self) -> &str {
        &self.encoded_reveal
    }
}

/// One authority's contribution to the current protocol run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    alg: DigestAlgorithm,
    authority_id: AuthorityId,
    commit_ts: Timestamp,
    hashed_reveal: [u8; 32],
    encoded_commit: String,
    reveal: Option<Reveal>,
    valid: bool,
}

impl Commit {
    /// Generate our own commitment for the protocol run starting at `now`.
    ///
    /// The random number is the digest of fresh OS randomness so that raw
    /// generator output is never published. Self-generated commits are
    /// valid by construction.
    pub fn generate(
        now: Timestamp,
        authority_id: AuthorityId,
        random: &dyn RandomSource,
    ) -> Result<Self, ProtocolError> {
        let mut raw = [0u8; RANDOM_NUMBER_LEN];
        random.fill_bytes(&mut raw)?;
        let random_number = sha3_256(&raw);

        let encoded_reveal = codec::encode_reveal(now, &random_number);
        let hashed_reveal = sha3_256(encoded_reveal.as_bytes());
        let encoded_commit = codec::encode_commit(now, &hashed_reveal);

        debug!(
            authority = %authority_id,
            commit = %encoded_commit,
            "generated our commitment"
        );

        Ok(Self {
            alg: DigestAlgorithm::Sha3_256,
            authority_id,
            commit_ts: now,
            hashed_reveal,
            encoded_commit,
            reveal: Some(Reveal {
                reveal_ts: now,
                random_number,
                encoded_reveal,
            }),
            valid: true,
        })
    }

    /// Rebuild a commit received from a peer or read from disk.
    ///
    /// The result is not valid until it has passed admission.
    pub fn decode(
        alg: DigestAlgorithm,
        authority_id: AuthorityId,
        encoded_commit: &str,
        encoded_reveal: Option<&str>,
    ) -> Result<Self, ProtocolError> {
        let (commit_ts, hashed_reveal) = codec::decode_commit(encoded_commit)?;
        let reveal = encoded_reveal.map(Reveal::decode).transpose()?;
        Ok(Self {
            alg,
            authority_id,
            commit_ts,
            hashed_reveal,
            encoded_commit: encoded_commit.to_string(),
            reveal,
            valid: false,
        })
    }

    /// The same commitment with the reveal stripped, as peers see it during
    /// the commit phase.
    pub fn commitment_only(&self) -> Self {
        Self {
            reveal: None,
            valid: false,
            ..self.clone()
        }
    }

    pub fn alg(&self) -> DigestAlgorithm {
        self.alg
    }

    pub fn authority_id(&self) -> &AuthorityId {
        &self.authority_id
    }

    pub fn commit_ts(&self) -> Timestamp {
        self.commit_ts
    }

    pub fn hashed_reveal(&self) -> &[u8; 32] {
        &self.hashed_reveal
    }

    pub fn encoded_commit(&self) -> &str {
        &self.encoded_commit
    }

    pub fn reveal(&self) -> Option<&Reveal> {
        self.reveal.as_ref()
    }

    pub fn encoded_reveal(&self) -> Option<&str> {
        self.reveal.as_ref().map(Reveal::encoded)
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn mark_valid(&mut self) {
        self.valid = true;
    }

    pub fn has_reveal(&self) -> bool {
        self.reveal.is_some()
    }

    /// Attach the reveal carried by `other` to this commit.
    ///
    /// Only the reveal fields move; the commitment itself is never replaced.
    pub fn copy_reveal_from(&mut self, other: &Commit) {
        if let Some(reveal) = &other.reveal {
            self.reveal = Some(reveal.clone());
        }
    }

    /// Prove that the reveal opens this commitment.
    pub fn verify_commit_and_reveal(&self) -> Result<(), ProtocolError> {
        let violation = |reason: String| ProtocolError::BindingViolation {
            authority: self.authority_id.to_hex(),
            reason,
        };

        let reveal = self
            .reveal
            .as_ref()
            .ok_or_else(|| violation("commit carries no reveal".to_string()))?;

        if self.commit_ts != reveal.reveal_ts {
            warn!(
                authority = %self.authority_id,
                commit_ts = self.commit_ts.as_secs(),
                reveal_ts = reveal.reveal_ts.as_secs(),
                "commit timestamp doesn't match reveal timestamp"
            );
            return Err(violation(format!(
                "commit timestamp {} differs from reveal timestamp {}",
                self.commit_ts.as_secs(),
                reveal.reveal_ts.as_secs()
            )));
        }

        if sha3_256(reveal.encoded_reveal.as_bytes()) != self.hashed_reveal {
            warn!(
                authority = %self.authority_id,
                "reveal value doesn't match the commit value"
            );
            return Err(violation("hash of reveal differs from commitment".to_string()));
        }

        Ok(())
    }
}

/// Whether two commits carry the same commitment value.
pub fn commitments_equal(a: &Commit, b: &Commit) -> bool {
    a.encoded_commit == b.encoded_commit
}
