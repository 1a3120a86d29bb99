//! Majority selection of the shared random values a consensus declares.

use srand_protocol::{ConsensusSrvs, SrVoteInfo};
use srand_types::SharedRandomValue;
use tracing::{debug, info};

/// Votes needed for a simple majority of `n_authorities`.
pub fn required_agreements(n_authorities: usize) -> usize {
    n_authorities / 2 + 1
}

/// Agreements required for a fresh SRV when no threshold has been voted:
/// two thirds of the authorities, rounded up.
pub fn default_agreement_threshold(n_authorities: usize) -> usize {
    (2 * n_authorities + 2) / 3
}

/// The SRV a majority of participating voters declare in the requested slot.
///
/// The most frequent value wins; on a tie the smallest value wins. It is
/// kept only if more than half of all authorities voted for it and, when
/// our own current SRV was computed locally in this run, at least
/// `agreement_threshold` of them did.
pub fn majority_srv(
    votes: &[SrVoteInfo],
    want_current: bool,
    n_authorities: usize,
    agreement_threshold: usize,
    srv_is_fresh: bool,
) -> Option<SharedRandomValue> {
    let mut srvs: Vec<&SharedRandomValue> = votes
        .iter()
        .filter(|v| v.participate)
        .filter_map(|v| v.srv(want_current))
        .collect();
    srvs.sort();

    let (winner, count) = most_frequent(&srvs)?;
    let slot = if want_current { "current" } else { "previous" };

    let required = required_agreements(n_authorities);
    if count < required {
        info!(slot, count, required, "not enough authorities agree on an SRV");
        return None;
    }
    if srv_is_fresh && count < agreement_threshold {
        info!(
            slot,
            count,
            agreement_threshold,
            "fresh SRV lacks the agreements needed to be kept"
        );
        return None;
    }

    debug!(slot, count, srv = %winner, "SRV reached agreement");
    Some(*winner)
}

/// Longest run of equal values in a sorted slice, first run on a tie.
fn most_frequent<'a>(
    sorted: &[&'a SharedRandomValue],
) -> Option<(&'a SharedRandomValue, usize)> {
    let mut best: Option<(&SharedRandomValue, usize)> = None;
    for run in sorted.chunk_by(|a, b| a == b) {
        if best.map_or(true, |(_, n)| run.len() > n) {
            best = Some((run[0], run.len()));
        }
    }
    best
}

/// Both SRV lines of the consensus built from `votes`.
pub fn consensus_srvs(
    votes: &[SrVoteInfo],
    n_authorities: usize,
    agreement_threshold: usize,
    srv_is_fresh: bool,
) -> ConsensusSrvs {
    ConsensusSrvs {
        previous: majority_srv(votes, false, n_authorities, agreement_threshold, srv_is_fresh),
        current: majority_srv(votes, true, n_authorities, agreement_threshold, srv_is_fresh),
    }
}
