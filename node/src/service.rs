//! The shared random service: one authority's view of the protocol.
//!
//! The surrounding directory authority drives it once per voting round:
//!
//! 1. [`SharedRandService::update`] with the round's valid-after time.
//! 2. [`SharedRandService::get_vote_lines`] to add our lines to our vote.
//! 3. [`SharedRandService::ingest_vote`] for every peer vote received.
//! 4. [`SharedRandService::get_consensus_lines`] when building the consensus.
//! 5. [`SharedRandService::on_consensus_finalized`] once it is signed.

use std::sync::Arc;

use srand_consensus::{admit, consensus_srvs, default_agreement_threshold};
use srand_crypto::{OsRandom, RandomSource};
use srand_protocol::lines::{parse_vote, render_vote_lines};
use srand_protocol::{ConsensusSrvs, SrVoteInfo};
use srand_store::{
    FileStatePersister, MemoryPersister, SharedRandState, StatePersister,
};
use srand_types::{AuthorityDirectory, AuthorityId, Clock, SharedRandomValue, Timestamp};
use srand_vrf::SrvProvider;
use tracing::{debug, info};

use crate::{NodeConfig, NodeError};

/// Collaborators the service consumes.
pub type SharedDirectory = Arc<dyn AuthorityDirectory + Send + Sync>;
pub type SharedClock = Arc<dyn Clock + Send + Sync>;
pub type SharedRandom = Arc<dyn RandomSource + Send + Sync>;

pub struct SharedRandService {
    state: SharedRandState,
    directory: SharedDirectory,
    clock: SharedClock,
    random: SharedRandom,
    participate: bool,
    agreement_threshold: Option<usize>,
}

impl SharedRandService {
    pub fn new(
        state: SharedRandState,
        directory: SharedDirectory,
        clock: SharedClock,
        random: SharedRandom,
    ) -> Self {
        Self {
            state,
            directory,
            clock,
            random,
            participate: true,
            agreement_threshold: None,
        }
    }

    /// Build the service described by `config`, loading the state file if
    /// there is one.
    pub fn from_config(
        config: &NodeConfig,
        directory: SharedDirectory,
        clock: SharedClock,
    ) -> Result<Self, NodeError> {
        let persister: Box<dyn StatePersister> = if config.save_to_disk {
            Box::new(FileStatePersister::new(config.state_path()))
        } else {
            Box::new(MemoryPersister::new())
        };
        let state = SharedRandState::init(persister, config.protocol_clock(), clock.now())?;
        info!(
            authority = %directory.my_identity(),
            authorities = directory.n_authorities(),
            participate = config.participate,
            save_to_disk = config.save_to_disk,
            "shared random service ready"
        );
        Ok(Self::new(state, directory, clock, Arc::new(OsRandom))
            .with_participation(config.participate)
            .with_agreement_threshold(config.agreement_threshold))
    }

    pub fn with_participation(mut self, participate: bool) -> Self {
        self.participate = participate;
        self
    }

    pub fn with_agreement_threshold(mut self, threshold: Option<usize>) -> Self {
        self.agreement_threshold = threshold;
        self
    }

    pub fn state(&self) -> &SharedRandState {
        &self.state
    }

    pub fn my_identity(&self) -> AuthorityId {
        self.directory.my_identity()
    }

    pub fn participates(&self) -> bool {
        self.participate
    }

    /// Agreements a fresh SRV needs to enter the consensus.
    pub fn agreement_threshold(&self) -> usize {
        self.agreement_threshold
            .unwrap_or_else(|| default_agreement_threshold(self.directory.n_authorities()))
    }

    /// Start of the voting round following the current one.
    pub fn next_valid_after(&self) -> Timestamp {
        let clock = self.state.clock();
        clock
            .current_round_start(self.clock.now())
            .plus(clock.voting_interval())
    }

    /// Prepare the state for the voting round starting at `valid_after`.
    pub fn update(&mut self, valid_after: Timestamp) -> Result<(), NodeError> {
        self.state
            .update(valid_after, self.directory.as_ref(), self.random.as_ref())?;
        Ok(())
    }

    /// Our shared random lines for the vote of the current round. Empty when
    /// we do not participate.
    pub fn get_vote_lines(&self) -> Vec<String> {
        if !self.participate {
            return Vec::new();
        }
        render_vote_lines(
            self.state.phase(),
            self.state.commits(),
            self.state.previous_srv(),
            self.state.current_srv(),
        )
    }

    /// Parse the shared random lines of `voter`'s vote and merge what is
    /// acceptable into our state. The parsed vote is returned for the
    /// consensus computation.
    pub fn ingest_vote<'a>(
        &mut self,
        voter: AuthorityId,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> Result<SrVoteInfo, NodeError> {
        let info = parse_vote(voter, lines);
        let admitted = admit(
            &mut self.state,
            info.commits.iter().cloned(),
            &voter,
            self.directory.as_ref(),
        )?;
        debug!(voter = %voter, admitted, "ingested vote");
        Ok(info)
    }

    /// The SRV lines of the consensus built from `votes`. Empty when we do
    /// not participate.
    pub fn get_consensus_lines(&self, votes: &[SrVoteInfo]) -> Vec<String> {
        self.consensus_srvs(votes)
            .map(|srvs| srvs.to_lines())
            .unwrap_or_default()
    }

    /// The SRVs the consensus built from `votes` declares.
    pub fn consensus_srvs(&self, votes: &[SrVoteInfo]) -> Option<ConsensusSrvs> {
        if !self.participate {
            return None;
        }
        Some(consensus_srvs(
            votes,
            self.directory.n_authorities(),
            self.agreement_threshold(),
            self.state.srv_is_fresh(),
        ))
    }

    /// Adopt the SRVs of a finalized consensus, whatever we believed
    /// before, then prepare the state for the next voting round.
    pub fn on_consensus_finalized(&mut self, srvs: &ConsensusSrvs) -> Result<(), NodeError> {
        self.state.set_srvs(srvs.previous, srvs.current)?;
        self.state.clear_srv_fresh();
        info!(
            previous = srvs.previous.is_some(),
            current = srvs.current.is_some(),
            "adopted consensus shared random values"
        );
        let next = self.next_valid_after();
        self.update(next)
    }

    /// Final flush.
    pub fn shutdown(self) -> Result<(), NodeError> {
        self.state.shutdown()?;
        Ok(())
    }
}

impl SrvProvider for SharedRandService {
    fn current_srv(&self) -> Option<SharedRandomValue> {
        self.state.current_srv().copied()
    }

    fn previous_srv(&self) -> Option<SharedRandomValue> {
        self.state.previous_srv().copied()
    }

    fn name(&self) -> &str {
        "shared-random"
    }
}
