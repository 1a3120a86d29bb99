//! Single-owner task for the shared random service.
//!
//! The service runs on its own tokio task and is only reached through
//! [`SharedRandHandle`], so every operation on the protocol state is applied
//! in the order its message arrived. On shutdown the task flushes the state
//! one last time.

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;

use srand_protocol::{ConsensusSrvs, SrVoteInfo};
use srand_types::{AuthorityId, Timestamp};
use srand_vrf::SrvProvider;

use crate::{NodeError, SharedRandService};

const COMMAND_CHANNEL_CAPACITY: usize = 64;

enum Command {
    Update {
        valid_after: Timestamp,
        reply: oneshot::Sender<Result<(), NodeError>>,
    },
    VoteLines {
        reply: oneshot::Sender<Vec<String>>,
    },
    IngestVote {
        voter: AuthorityId,
        lines: Vec<String>,
        reply: oneshot::Sender<Result<SrVoteInfo, NodeError>>,
    },
    ConsensusLines {
        votes: Vec<SrVoteInfo>,
        reply: oneshot::Sender<Vec<String>>,
    },
    ConsensusFinalized {
        srvs: ConsensusSrvs,
        reply: oneshot::Sender<Result<(), NodeError>>,
    },
    Srvs {
        reply: oneshot::Sender<ConsensusSrvs>,
    },
}

/// Cloneable handle to the task owning the [`SharedRandService`].
#[derive(Clone)]
pub struct SharedRandHandle {
    tx: mpsc::Sender<Command>,
}

impl SharedRandHandle {
    /// Move `service` onto its own task. The task stops when every handle
    /// is dropped or when `shutdown` fires, flushing the state either way.
    pub fn spawn(
        service: SharedRandService,
        shutdown: broadcast::Receiver<()>,
    ) -> (Self, JoinHandle<Result<(), NodeError>>) {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let task = tokio::spawn(run(service, rx, shutdown));
        (Self { tx }, task)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, NodeError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| NodeError::ServiceStopped)?;
        rx.await.map_err(|_| NodeError::ServiceStopped)
    }

    pub async fn update(&self, valid_after: Timestamp) -> Result<(), NodeError> {
        self.request(|reply| Command::Update { valid_after, reply })
            .await?
    }

    pub async fn vote_lines(&self) -> Result<Vec<String>, NodeError> {
        self.request(|reply| Command::VoteLines { reply }).await
    }

    pub async fn ingest_vote(
        &self,
        voter: AuthorityId,
        lines: Vec<String>,
    ) -> Result<SrVoteInfo, NodeError> {
        self.request(|reply| Command::IngestVote {
            voter,
            lines,
            reply,
        })
        .await?
    }

    pub async fn consensus_lines(&self, votes: Vec<SrVoteInfo>) -> Result<Vec<String>, NodeError> {
        self.request(|reply| Command::ConsensusLines { votes, reply })
            .await
    }

    pub async fn consensus_finalized(&self, srvs: ConsensusSrvs) -> Result<(), NodeError> {
        self.request(|reply| Command::ConsensusFinalized { srvs, reply })
            .await?
    }

    /// The previous and current SRVs in force.
    pub async fn srvs(&self) -> Result<ConsensusSrvs, NodeError> {
        self.request(|reply| Command::Srvs { reply }).await
    }
}

async fn run(
    mut service: SharedRandService,
    mut rx: mpsc::Receiver<Command>,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), NodeError> {
    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => {
                tracing::debug!("shared random task shutting down");
                break;
            }
            cmd = rx.recv() => {
                let Some(cmd) = cmd else {
                    tracing::debug!("all shared random handles dropped");
                    break;
                };
                handle(&mut service, cmd);
            }
        }
    }
    service.shutdown()
}

fn handle(service: &mut SharedRandService, cmd: Command) {
    // A dropped reply receiver only means the caller stopped waiting.
    match cmd {
        Command::Update { valid_after, reply } => {
            let _ = reply.send(service.update(valid_after));
        }
        Command::VoteLines { reply } => {
            let _ = reply.send(service.get_vote_lines());
        }
        Command::IngestVote {
            voter,
            lines,
            reply,
        } => {
            let result = service.ingest_vote(voter, lines.iter().map(String::as_str));
            let _ = reply.send(result);
        }
        Command::ConsensusLines { votes, reply } => {
            let _ = reply.send(service.get_consensus_lines(&votes));
        }
        Command::ConsensusFinalized { srvs, reply } => {
            let _ = reply.send(service.on_consensus_finalized(&srvs));
        }
        Command::Srvs { reply } => {
            let _ = reply.send(ConsensusSrvs {
                previous: service.previous_srv(),
                current: service.current_srv(),
            });
        }
    }
}
