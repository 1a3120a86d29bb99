//! The protocol state and its single mutation surface.

use std::collections::BTreeMap;

use srand_crypto::RandomSource;
use srand_protocol::Commit;
use srand_types::{AuthorityDirectory, AuthorityId, Phase, SharedRandomValue, Timestamp};
use srand_vrf::{clock, compute_srv, ProtocolClock};
use tracing::{debug, info, warn};

use crate::{DiskState, StatePersister, StoreError};

/// Everything an authority remembers about the current protocol run.
///
/// Only [`SharedRandState`] hands out mutable access, so every change is
/// followed by a flush.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolState {
    pub phase: Phase,
    pub valid_after: Timestamp,
    pub valid_until: Timestamp,
    pub commits: BTreeMap<AuthorityId, Commit>,
    pub previous_srv: Option<SharedRandomValue>,
    pub current_srv: Option<SharedRandomValue>,
    /// Set when `current_srv` was computed locally at the last run boundary.
    /// In memory only.
    pub is_srv_fresh: bool,
    pub n_commit_rounds: u64,
    pub n_reveal_rounds: u64,
    pub n_protocol_runs: u64,
}

impl ProtocolState {
    /// A brand new state for a node booting at `now`.
    pub fn fresh(clock: &ProtocolClock, now: Timestamp) -> Self {
        Self {
            phase: clock.phase_of(now),
            valid_after: Timestamp::EPOCH,
            valid_until: clock.state_expiry(now),
            commits: BTreeMap::new(),
            previous_srv: None,
            current_srv: None,
            is_srv_fresh: false,
            n_commit_rounds: 0,
            n_reveal_rounds: 0,
            n_protocol_runs: 0,
        }
    }

    /// A state file never updated past boot carries `ValidAfter` at the
    /// epoch; its phase is the one in force at `now`.
    fn from_disk(disk: DiskState, clock: &ProtocolClock, now: Timestamp) -> Self {
        let phase = if disk.valid_after == Timestamp::EPOCH {
            clock.phase_of(now)
        } else {
            clock.phase_of(disk.valid_after)
        };
        let commits = disk
            .commits
            .into_iter()
            .map(|c| (*c.authority_id(), c))
            .collect();
        Self {
            phase,
            valid_after: disk.valid_after,
            valid_until: disk.valid_until,
            commits,
            previous_srv: disk.previous_srv,
            current_srv: disk.current_srv,
            is_srv_fresh: false,
            n_commit_rounds: 0,
            n_reveal_rounds: 0,
            n_protocol_runs: 0,
        }
    }

    /// The disk mirror of this state.
    pub fn to_disk(&self) -> DiskState {
        let mut disk = DiskState::new(self.valid_after, self.valid_until);
        disk.commits = self.commits.values().cloned().collect();
        disk.previous_srv = self.previous_srv;
        disk.current_srv = self.current_srv;
        disk
    }
}

/// Owner of the one [`ProtocolState`] of this process.
pub struct SharedRandState {
    state: ProtocolState,
    clock: ProtocolClock,
    persister: Box<dyn StatePersister>,
}

impl SharedRandState {
    /// Load the state from `persister`, or start fresh if there is nothing
    /// usable there. The resulting state is flushed once.
    ///
    /// A corrupt or expired state file is discarded, never fatal. Backend
    /// read errors propagate.
    pub fn init(
        persister: Box<dyn StatePersister>,
        clock: ProtocolClock,
        now: Timestamp,
    ) -> Result<Self, StoreError> {
        let state = match load(persister.as_ref(), &clock, now)? {
            Some(state) => state,
            None => {
                info!(
                    phase = %clock.phase_of(now),
                    "starting with a fresh shared random state"
                );
                ProtocolState::fresh(&clock, now)
            }
        };
        let this = Self {
            state,
            clock,
            persister,
        };
        this.flush()?;
        Ok(this)
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.persister.save(&self.state.to_disk().to_text())
    }

    // -- reads --

    pub fn state(&self) -> &ProtocolState {
        &self.state
    }

    pub fn clock(&self) -> &ProtocolClock {
        &self.clock
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn valid_after(&self) -> Timestamp {
        self.state.valid_after
    }

    pub fn valid_until(&self) -> Timestamp {
        self.state.valid_until
    }

    pub fn commit(&self, authority: &AuthorityId) -> Option<&Commit> {
        self.state.commits.get(authority)
    }

    /// Held commits, ordered by authority id.
    pub fn commits(&self) -> impl Iterator<Item = &Commit> {
        self.state.commits.values()
    }

    pub fn n_commits(&self) -> usize {
        self.state.commits.len()
    }

    pub fn previous_srv(&self) -> Option<&SharedRandomValue> {
        self.state.previous_srv.as_ref()
    }

    pub fn current_srv(&self) -> Option<&SharedRandomValue> {
        self.state.current_srv.as_ref()
    }

    pub fn srv_is_fresh(&self) -> bool {
        self.state.is_srv_fresh
    }

    pub fn n_commit_rounds(&self) -> u64 {
        self.state.n_commit_rounds
    }

    pub fn n_reveal_rounds(&self) -> u64 {
        self.state.n_reveal_rounds
    }

    pub fn n_protocol_runs(&self) -> u64 {
        self.state.n_protocol_runs
    }

    // -- mutations, one flush each --

    /// Store `commit`, replacing any commit from the same authority.
    pub fn put_commit(&mut self, commit: Commit) -> Result<(), StoreError> {
        self.state.commits.insert(*commit.authority_id(), commit);
        self.flush()
    }

    /// Attach the reveal carried by `commit` to the stored commit of the
    /// same authority. Returns `false` if there is no such commit.
    pub fn copy_reveal(&mut self, commit: &Commit) -> Result<bool, StoreError> {
        let Some(saved) = self.state.commits.get_mut(commit.authority_id()) else {
            return Ok(false);
        };
        saved.copy_reveal_from(commit);
        self.flush()?;
        Ok(true)
    }

    pub fn delete_commit(&mut self, authority: &AuthorityId) -> Result<Option<Commit>, StoreError> {
        let removed = self.state.commits.remove(authority);
        self.flush()?;
        Ok(removed)
    }

    pub fn delete_all_commits(&mut self) -> Result<(), StoreError> {
        self.state.commits.clear();
        self.flush()
    }

    pub fn set_previous_srv(&mut self, srv: Option<SharedRandomValue>) -> Result<(), StoreError> {
        self.state.previous_srv = srv;
        self.flush()
    }

    pub fn set_current_srv(&mut self, srv: Option<SharedRandomValue>) -> Result<(), StoreError> {
        self.state.current_srv = srv;
        self.flush()
    }

    /// Replace both SRVs at once.
    pub fn set_srvs(
        &mut self,
        previous: Option<SharedRandomValue>,
        current: Option<SharedRandomValue>,
    ) -> Result<(), StoreError> {
        self.state.previous_srv = previous;
        self.state.current_srv = current;
        self.flush()
    }

    pub fn set_phase(&mut self, phase: Phase) -> Result<(), StoreError> {
        self.state.phase = phase;
        self.flush()
    }

    pub fn set_valid_after(&mut self, valid_after: Timestamp) -> Result<(), StoreError> {
        self.state.valid_after = valid_after;
        self.flush()
    }

    pub fn save(&self) -> Result<(), StoreError> {
        self.flush()
    }

    pub fn mark_srv_fresh(&mut self) {
        self.state.is_srv_fresh = true;
    }

    pub fn clear_srv_fresh(&mut self) {
        self.state.is_srv_fresh = false;
    }

    /// Advance the state machine to the round starting at `valid_after`.
    ///
    /// Calling it again for the same (or an older) round does nothing. On
    /// entering a commit phase a new protocol run starts: the SRVs rotate,
    /// a new current SRV is computed if the previous run reached its reveal
    /// phase with at least one reveal, and the commits are replaced by a fresh commitment of ours.
    /// The whole update is flushed once at the end.
    pub fn update(
        &mut self,
        valid_after: Timestamp,
        directory: &dyn AuthorityDirectory,
        random: &dyn RandomSource,
    ) -> Result<(), StoreError> {
        if valid_after <= self.state.valid_after {
            info!(
                valid_after = %valid_after,
                state_valid_after = %self.state.valid_after,
                "asked to update state twice, ignoring"
            );
            return Ok(());
        }

        let next_phase = self.clock.phase_of(valid_after);
        let me = directory.my_identity();

        if clock::is_transition(self.state.phase, next_phase) && next_phase == Phase::Commit {
            self.new_protocol_run(valid_after, directory, random);
        } else if self.state.phase == Phase::Commit && !self.state.commits.contains_key(&me) {
            self.add_our_commit(valid_after, me, random);
        }

        self.state.phase = next_phase;
        self.state.valid_after = valid_after;
        self.state.valid_until = self.clock.state_expiry(valid_after);

        match self.state.phase {
            Phase::Commit => {
                if self.state.n_reveal_rounds != 0 {
                    return Err(StoreError::InvariantBroken(format!(
                        "{} reveal rounds counted during a commit phase",
                        self.state.n_reveal_rounds
                    )));
                }
                self.state.n_commit_rounds += 1;
            }
            Phase::Reveal => self.state.n_reveal_rounds += 1,
        }

        info!(
            phase = %self.state.phase,
            valid_after = %valid_after,
            commit_rounds = self.state.n_commit_rounds,
            reveal_rounds = self.state.n_reveal_rounds,
            commits = self.state.commits.len(),
            "shared random state updated"
        );
        self.flush()
    }

    fn new_protocol_run(
        &mut self,
        valid_after: Timestamp,
        directory: &dyn AuthorityDirectory,
        random: &dyn RandomSource,
    ) {
        if self.state.phase == Phase::Reveal {
            self.state.previous_srv = self.state.current_srv.take();
            let srv = compute_srv(
                self.state.commits.values(),
                self.state.previous_srv.as_ref(),
                directory,
            );
            match srv {
                Some(srv) => {
                    info!(srv = %srv, "computed new shared random value for the finished run");
                    self.state.current_srv = Some(srv);
                    self.state.is_srv_fresh = true;
                }
                None => info!("no reveals in the finished run, current SRV left empty"),
            }
        }

        self.state.n_commit_rounds = 0;
        self.state.n_reveal_rounds = 0;
        self.state.n_protocol_runs += 1;
        self.state.commits.clear();
        debug!(run = self.state.n_protocol_runs, "starting a new protocol run");

        self.add_our_commit(valid_after, directory.my_identity(), random);
    }

    fn add_our_commit(&mut self, valid_after: Timestamp, me: AuthorityId, random: &dyn RandomSource) {
        match Commit::generate(valid_after, me, random) {
            Ok(commit) => {
                self.state.commits.insert(me, commit);
            }
            Err(e) => warn!(error = %e, "unable to generate our commitment, not participating this run"),
        }
    }

    /// Final flush before the process exits.
    pub fn shutdown(self) -> Result<(), StoreError> {
        self.flush()?;
        info!(valid_after = %self.state.valid_after, "shared random state saved on shutdown");
        Ok(())
    }
}

fn load(
    persister: &dyn StatePersister,
    clock: &ProtocolClock,
    now: Timestamp,
) -> Result<Option<ProtocolState>, StoreError> {
    let Some(text) = persister.load()? else {
        debug!("no shared random state on disk");
        return Ok(None);
    };
    match DiskState::parse(&text, now) {
        Ok(Some(disk)) => {
            info!(
                valid_after = %disk.valid_after,
                commits = disk.commits.len(),
                "loaded shared random state from disk"
            );
            Ok(Some(ProtocolState::from_disk(disk, clock, now)))
        }
        Ok(None) => Ok(None),
        Err(StoreError::StateCorrupt(reason)) => {
            warn!(%reason, "discarding corrupt shared random state");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}
