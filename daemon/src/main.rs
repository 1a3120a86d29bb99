//! Shared random daemon: entry point for running an authority's shared
//! random state keeper and for operator tooling around it.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use srand_crypto::OsRandom;
use srand_node::service::SharedClock;
use srand_node::{
    init_logging, NodeConfig, SharedRandHandle, SharedRandService, ShutdownController,
    StaticDirectory,
};
use srand_nullables::{NullClock, NullDirectory, NullStatePersister};
use srand_protocol::lines::{parse_consensus, srv_args};
use srand_protocol::SrVoteInfo;
use srand_store::{DiskState, SharedRandState};
use srand_types::{AuthorityId, Clock, SharedRandomValue, SystemClock, Timestamp};
use srand_vrf::{ProtocolClock, SrvProvider};

#[derive(Parser)]
#[command(name = "srand-daemon", about = "Shared random protocol daemon")]
struct Cli {
    /// Directory holding the state file.
    #[arg(long, env = "SRAND_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Length of one voting round in seconds.
    #[arg(long, env = "SRAND_VOTING_INTERVAL")]
    voting_interval: Option<u64>,

    /// Our authority fingerprint (40 hex characters).
    #[arg(long, env = "SRAND_IDENTITY")]
    identity: Option<String>,

    /// Recognized authority fingerprints (comma-separated).
    #[arg(long, env = "SRAND_AUTHORITIES", value_delimiter = ',')]
    authorities: Vec<String>,

    /// Do not take part in the protocol, only follow the consensus.
    #[arg(long, env = "SRAND_NO_PARTICIPATE")]
    no_participate: bool,

    /// Keep the state in memory only.
    #[arg(long, env = "SRAND_NO_SAVE")]
    no_save: bool,

    /// Agreements a fresh SRV needs to enter the consensus.
    #[arg(long, env = "SRAND_AGREEMENT_THRESHOLD")]
    agreement_threshold: Option<usize>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SRAND_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SRAND_LOG_FORMAT")]
    log_format: Option<String>,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Keep the shared random state in step with the voting schedule.
    Run,
    /// Print the contents of a state file.
    Inspect {
        /// State file to read (defaults to the configured one).
        path: Option<PathBuf>,
    },
    /// Print where a moment falls in the protocol schedule.
    Schedule {
        /// Unix time to place (defaults to now).
        #[arg(long)]
        at: Option<u64>,
    },
    /// Run whole protocol runs between in-process authorities.
    Simulate {
        #[arg(long, default_value_t = 3)]
        authorities: u8,
        #[arg(long, default_value_t = 2)]
        runs: u64,
    },
}

impl Cli {
    /// The file configuration (or defaults) with CLI flags applied on top.
    fn node_config(&self) -> anyhow::Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let path = path.to_string_lossy();
                NodeConfig::from_toml_file(&path)
                    .with_context(|| format!("loading config file {path}"))?
            }
            None => NodeConfig::default(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(secs) = self.voting_interval {
            config.voting_interval_secs = secs;
        }
        if let Some(identity) = &self.identity {
            config.identity = Some(identity.clone());
        }
        if !self.authorities.is_empty() {
            config.authorities = self.authorities.clone();
        }
        if self.no_participate {
            config.participate = false;
        }
        if self.no_save {
            config.save_to_disk = false;
        }
        if self.agreement_threshold.is_some() {
            config.agreement_threshold = self.agreement_threshold;
        }
        if let Some(level) = &self.log_level {
            config.log_level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.log_format = format.clone();
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.node_config()?;

    init_logging(config.log_format()?, &config.log_level)
        .context("installing the tracing subscriber")?;

    match cli.command {
        Command::Run => run(config).await?,
        Command::Inspect { path } => inspect(&path.unwrap_or_else(|| config.state_path()))?,
        Command::Schedule { at } => {
            let at = at.map(Timestamp::new).unwrap_or_else(Timestamp::now);
            schedule(&config.protocol_clock(), at);
        }
        Command::Simulate { authorities, runs } => {
            simulate(authorities, runs, config.voting_interval_secs)?
        }
    }

    Ok(())
}

async fn run(config: NodeConfig) -> anyhow::Result<()> {
    let directory = Arc::new(StaticDirectory::from_config(&config)?);
    let clock: SharedClock = Arc::new(SystemClock);
    let round_clock = config.protocol_clock();

    tracing::info!(
        state_file = %config.state_path().display(),
        voting_interval = round_clock.voting_interval(),
        participate = config.participate,
        "starting shared random daemon"
    );

    let service = SharedRandService::from_config(&config, directory, clock.clone())?;
    let shutdown = ShutdownController::new();
    let (handle, task) = SharedRandHandle::spawn(service, shutdown.subscribe());

    // Catch up with the round already in progress.
    handle
        .update(round_clock.current_round_start(clock.now()))
        .await?;

    let mut stop = shutdown.subscribe();
    let ticker_handle = handle.clone();
    let ticker = tokio::spawn(async move {
        loop {
            let now = clock.now();
            let next = round_clock
                .current_round_start(now)
                .plus(round_clock.voting_interval());
            let wait = Duration::from_secs(now.elapsed_since(next).max(1));
            tokio::select! {
                biased;
                _ = stop.recv() => break,
                _ = tokio::time::sleep(wait) => {
                    if let Err(e) = ticker_handle.update(next).await {
                        tracing::error!(error = %e, "shared random state update failed");
                        break;
                    }
                    if let Ok(srvs) = ticker_handle.srvs().await {
                        tracing::info!(
                            valid_after = %next,
                            phase = %round_clock.phase_of(next),
                            previous = ?srvs.previous,
                            current = ?srvs.current,
                            "voting round started"
                        );
                    }
                }
            }
        }
    });

    shutdown.wait_for_signal().await;
    ticker.await?;
    drop(handle);
    task.await??;

    tracing::info!("shared random daemon exited cleanly");
    Ok(())
}

fn inspect(path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading state file {}", path.display()))?;
    let Some(state) = DiskState::parse(&text, Timestamp::EPOCH)? else {
        bail!("state file {} has an empty validity window", path.display());
    };

    let now = Timestamp::now();
    println!("file:        {}", path.display());
    println!("version:     {}", state.version);
    println!("valid after: {}", state.valid_after);
    println!(
        "valid until: {}{}",
        state.valid_until,
        if state.valid_until < now { " (expired)" } else { "" }
    );
    println!("previous:    {}", describe(state.previous_srv.as_ref()));
    println!("current:     {}", describe(state.current_srv.as_ref()));
    println!("commits:     {}", state.commits.len());
    for commit in &state.commits {
        println!(
            "  {} committed {}{}",
            commit.authority_id(),
            commit.commit_ts(),
            if commit.has_reveal() { ", revealed" } else { "" }
        );
    }
    Ok(())
}

fn describe(srv: Option<&SharedRandomValue>) -> String {
    srv.map(srv_args).unwrap_or_else(|| "none".to_string())
}

fn schedule(clock: &ProtocolClock, at: Timestamp) {
    let round = clock.round_in_run(at);
    println!("time:          {at}");
    println!("phase:         {}", clock.phase_of(at));
    println!("round:         {} of {}", round + 1, clock.rounds_per_run());
    println!("round start:   {}", clock.current_round_start(at));
    println!("run start:     {}", clock.protocol_run_start(at));
    println!("state expires: {}", clock.state_expiry(at));
}

/// Drive `n` authorities through `runs` protocol runs, exchanging votes and
/// adopting the consensus every round.
fn simulate(n: u8, runs: u64, voting_interval: u64) -> anyhow::Result<()> {
    if n == 0 {
        bail!("need at least one authority");
    }
    let round_clock = ProtocolClock::new(voting_interval);
    let start = round_clock
        .protocol_run_start(Timestamp::now())
        .plus(round_clock.protocol_run_duration());
    let clock = Arc::new(NullClock::new(start.as_secs()));
    let directory = NullDirectory::numbered(n);

    let mut services = (1..=n)
        .map(|i| -> anyhow::Result<SharedRandService> {
            let state = SharedRandState::init(
                Box::new(NullStatePersister::new()),
                round_clock,
                clock.now(),
            )?;
            Ok(SharedRandService::new(
                state,
                Arc::new(directory.as_seen_by(AuthorityId::new([i; 20]))),
                clock.clone(),
                Arc::new(OsRandom),
            ))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    for run in 1..=runs {
        for round in 0..round_clock.rounds_per_run() {
            let offset = (run - 1) * round_clock.protocol_run_duration() + round * voting_interval;
            let valid_after = start.plus(offset);
            clock.set(valid_after.as_secs());
            simulate_round(&mut services, valid_after)?;
        }
        // The first round of the next run computes the SRV of this one.
        let boundary = start.plus(run * round_clock.protocol_run_duration());
        clock.set(boundary.as_secs());
        simulate_round(&mut services, boundary)?;
        println!(
            "run {run}: current {}",
            describe(services[0].current_srv().as_ref())
        );
    }

    let first = services[0].current_srv();
    if services.iter().any(|s| s.current_srv() != first) {
        bail!("authorities disagree on the current SRV");
    }
    Ok(())
}

fn simulate_round(
    services: &mut [SharedRandService],
    valid_after: Timestamp,
) -> anyhow::Result<()> {
    for svc in services.iter_mut() {
        svc.update(valid_after)?;
    }
    let votes: Vec<(AuthorityId, Vec<String>)> = services
        .iter()
        .map(|svc| (svc.my_identity(), svc.get_vote_lines()))
        .collect();

    let mut consensus = Vec::new();
    for svc in services.iter_mut() {
        let infos = votes
            .iter()
            .map(|(voter, lines)| svc.ingest_vote(*voter, lines.iter().map(String::as_str)))
            .collect::<Result<Vec<SrVoteInfo>, _>>()?;
        consensus.push(svc.get_consensus_lines(&infos));
    }

    let srvs = parse_consensus(consensus[0].iter().map(String::as_str));
    for svc in services.iter_mut() {
        svc.on_consensus_finalized(&srvs)?;
    }
    Ok(())
}
