//! Commit admission.
//!
//! Every commit extracted from a peer's vote passes through [`should_keep`]
//! before it touches our state. A commit must be authored by the authority
//! whose vote carried it, and that authority must be one we recognize.
//! During the commit phase only new, reveal-free commitments are accepted;
//! during the reveal phase only the first reveal that opens a commitment we
//! already hold is accepted.

use srand_protocol::{commitments_equal, Commit};
use srand_store::{SharedRandState, StoreError};
use srand_types::{AuthorityDirectory, AuthorityId, Phase};
use tracing::{debug, info, warn};

use crate::AdmissionError;

/// Decide whether `commit`, received in the vote of `voter`, may be merged
/// into `state`.
pub fn should_keep(
    commit: &Commit,
    voter: &AuthorityId,
    state: &SharedRandState,
    directory: &dyn AuthorityDirectory,
) -> Result<(), AdmissionError> {
    let authority = commit.authority_id();

    if authority != voter {
        debug!(voter = %voter, authority = %authority, "commit is not authoritative");
        return Err(AdmissionError::NotAuthoritative {
            voter: voter.to_hex(),
            authority: authority.to_hex(),
        });
    }

    if !directory.is_known_authority(voter) {
        debug!(authority = %voter, "commit from an unrecognized authority");
        return Err(AdmissionError::UnknownAuthority(voter.to_hex()));
    }

    let saved = state.commit(authority);

    match state.phase() {
        Phase::Commit => {
            if let Some(saved) = saved {
                if !commitments_equal(commit, saved) {
                    info!(authority = %authority, "received altered commit in commit phase");
                    return Err(AdmissionError::CommitmentChanged(authority.to_hex()));
                }
                debug!(authority = %authority, "ignoring known commit during commit phase");
                return Err(AdmissionError::AlreadyCommitted(authority.to_hex()));
            }
            if commit.has_reveal() {
                warn!(authority = %authority, "received a commit with a reveal during commit phase");
                return Err(AdmissionError::EarlyReveal(authority.to_hex()));
            }
        }
        Phase::Reveal => {
            let Some(saved) = saved else {
                debug!(authority = %authority, "ignoring commit first seen in reveal phase");
                return Err(AdmissionError::NoSavedCommit(authority.to_hex()));
            };
            if !commitments_equal(commit, saved) {
                warn!(
                    authority = %authority,
                    "commit decoded in reveal phase doesn't match the one we hold"
                );
                return Err(AdmissionError::CommitmentChanged(authority.to_hex()));
            }
            if saved.has_reveal() {
                debug!(authority = %authority, "ignoring known reveal");
                return Err(AdmissionError::AlreadyRevealed(authority.to_hex()));
            }
            if !commit.has_reveal() {
                debug!(authority = %authority, "commit without reveal during reveal phase");
                return Err(AdmissionError::MissingReveal(authority.to_hex()));
            }
            if let Err(e) = commit.verify_commit_and_reveal() {
                warn!(authority = %authority, error = %e, "reveal does not open its commitment");
                return Err(e.into());
            }
        }
    }

    Ok(())
}

/// Merge the acceptable commits of one vote into `state`.
///
/// Rejected commits are skipped. Returns how many were merged; only
/// storage failures are errors.
pub fn admit(
    state: &mut SharedRandState,
    commits: impl IntoIterator<Item = Commit>,
    voter: &AuthorityId,
    directory: &dyn AuthorityDirectory,
) -> Result<usize, StoreError> {
    let mut admitted = 0;
    for mut commit in commits {
        if should_keep(&commit, voter, state, directory).is_err() {
            continue;
        }
        commit.mark_valid();
        match state.phase() {
            Phase::Commit => state.put_commit(commit)?,
            Phase::Reveal => {
                state.copy_reveal(&commit)?;
            }
        }
        admitted += 1;
    }
    if admitted > 0 {
        debug!(voter = %voter, admitted, phase = %state.phase(), "admitted commits from vote");
    }
    Ok(admitted)
}
