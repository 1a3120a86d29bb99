//! The `shared-rand-*` lines carried in votes and consensus documents.
//!
//! ```text
//! shared-rand-participate
//! shared-rand-commit <version> <alg> <fingerprint> <encoded_commit>[ <encoded_reveal>]
//! shared-rand-previous-value <num_reveals> <base64_srv>
//! shared-rand-current-value <num_reveals> <base64_srv>
//! ```
//!
//! Parsing is line-local: a malformed line is logged and skipped, the rest
//! of the document is still used.

use srand_types::{AuthorityId, Phase, SharedRandomValue, SR_PROTO_VERSION};
use tracing::{debug, info};

use crate::{codec, version, Commit, DigestAlgorithm, ProtocolError};

pub const PARTICIPATE_KEYWORD: &str = "shared-rand-participate";
pub const COMMIT_KEYWORD: &str = "shared-rand-commit";
pub const PREVIOUS_SRV_KEYWORD: &str = "shared-rand-previous-value";
pub const CURRENT_SRV_KEYWORD: &str = "shared-rand-current-value";

/// Render the arguments of a commit line:
/// `<version> <alg> <fingerprint> <encoded_commit>[ <encoded_reveal>]`.
///
/// Shared by vote lines and the disk state `Commit` entries.
pub fn commit_args(commit: &Commit, include_reveal: bool) -> String {
    let mut args = format!(
        "{} {} {} {}",
        SR_PROTO_VERSION,
        commit.alg().name(),
        commit.authority_id().to_hex(),
        commit.encoded_commit()
    );
    if include_reveal {
        if let Some(reveal) = commit.encoded_reveal() {
            args.push(' ');
            args.push_str(reveal);
        }
    }
    args
}

/// Parse the arguments of a commit line back into a (not yet valid) commit.
pub fn parse_commit_args(args: &[&str]) -> Result<Commit, ProtocolError> {
    if args.len() < 4 {
        return Err(ProtocolError::MalformedEncoding(format!(
            "commit line has {} arguments, at least 4 expected",
            args.len()
        )));
    }
    version::parse_version(args[0])?;
    let alg = DigestAlgorithm::parse(args[1])?;
    let authority_id = AuthorityId::from_hex(args[2])
        .map_err(|e| ProtocolError::MalformedEncoding(e.to_string()))?;
    Commit::decode(alg, authority_id, args[3], args.get(4).copied())
}

/// The vote line for one held commit. Reveals are only published during the
/// reveal phase.
pub fn render_commit_line(commit: &Commit, phase: Phase) -> String {
    format!(
        "{} {}",
        COMMIT_KEYWORD,
        commit_args(commit, phase == Phase::Reveal)
    )
}

/// Render the `<num_reveals> <base64_srv>` arguments of an SRV line.
pub fn srv_args(srv: &SharedRandomValue) -> String {
    format!("{} {}", srv.num_reveals(), codec::encode_srv_value(srv))
}

/// Parse the `<num_reveals> <base64_srv>` arguments of an SRV line.
pub fn parse_srv_args(args: &[&str]) -> Result<SharedRandomValue, ProtocolError> {
    if args.len() < 2 {
        return Err(ProtocolError::MalformedEncoding(format!(
            "SRV line has {} arguments, 2 expected",
            args.len()
        )));
    }
    let num_reveals: u64 = args[0].parse().map_err(|_| {
        ProtocolError::MalformedEncoding(format!("SRV reveal count {:?}", args[0]))
    })?;
    let value = codec::decode_srv_value(args[1])?;
    Ok(SharedRandomValue::new(num_reveals, value))
}

/// The previous/current SRV lines, in that order, skipping absent values.
pub fn render_srv_lines(
    previous: Option<&SharedRandomValue>,
    current: Option<&SharedRandomValue>,
) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(srv) = previous {
        lines.push(format!("{} {}", PREVIOUS_SRV_KEYWORD, srv_args(srv)));
    }
    if let Some(srv) = current {
        lines.push(format!("{} {}", CURRENT_SRV_KEYWORD, srv_args(srv)));
    }
    lines
}

/// Everything an authority says about shared randomness in its vote: the
/// participation line, one line per held commit (sorted), then the SRVs.
pub fn render_vote_lines<'a>(
    phase: Phase,
    commits: impl IntoIterator<Item = &'a Commit>,
    previous: Option<&SharedRandomValue>,
    current: Option<&SharedRandomValue>,
) -> Vec<String> {
    let mut commit_lines: Vec<String> = commits
        .into_iter()
        .map(|c| render_commit_line(c, phase))
        .collect();
    commit_lines.sort();

    let mut lines = Vec::with_capacity(commit_lines.len() + 3);
    lines.push(PARTICIPATE_KEYWORD.to_string());
    lines.extend(commit_lines);
    lines.extend(render_srv_lines(previous, current));
    lines
}

/// Shared random information extracted from one authority's vote.
#[derive(Clone, Debug)]
pub struct SrVoteInfo {
    pub voter: AuthorityId,
    pub participate: bool,
    pub commits: Vec<Commit>,
    pub previous_srv: Option<SharedRandomValue>,
    pub current_srv: Option<SharedRandomValue>,
}

impl SrVoteInfo {
    pub fn new(voter: AuthorityId) -> Self {
        Self {
            voter,
            participate: false,
            commits: Vec::new(),
            previous_srv: None,
            current_srv: None,
        }
    }

    /// The SRV this vote declares for the requested slot.
    pub fn srv(&self, current: bool) -> Option<&SharedRandomValue> {
        if current {
            self.current_srv.as_ref()
        } else {
            self.previous_srv.as_ref()
        }
    }
}

/// Extract the shared random lines of a vote. Unrelated lines are ignored.
pub fn parse_vote<'a>(voter: AuthorityId, lines: impl IntoIterator<Item = &'a str>) -> SrVoteInfo {
    let mut info = SrVoteInfo::new(voter);
    for line in lines {
        let mut fields = line.split_whitespace();
        let Some(keyword) = fields.next() else {
            continue;
        };
        let args: Vec<&str> = fields.collect();
        match keyword {
            PARTICIPATE_KEYWORD => info.participate = true,
            COMMIT_KEYWORD => match parse_commit_args(&args) {
                Ok(commit) => info.commits.push(commit),
                Err(e) => info!(voter = %voter, error = %e, "skipping commit line in vote"),
            },
            PREVIOUS_SRV_KEYWORD => match parse_srv_args(&args) {
                Ok(srv) => info.previous_srv = Some(srv),
                Err(e) => info!(voter = %voter, error = %e, "skipping previous SRV line in vote"),
            },
            CURRENT_SRV_KEYWORD => match parse_srv_args(&args) {
                Ok(srv) => info.current_srv = Some(srv),
                Err(e) => info!(voter = %voter, error = %e, "skipping current SRV line in vote"),
            },
            _ => {}
        }
    }
    debug!(
        voter = %voter,
        participate = info.participate,
        commits = info.commits.len(),
        "parsed shared random vote lines"
    );
    info
}

/// The SRVs a finalized consensus declares.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConsensusSrvs {
    pub previous: Option<SharedRandomValue>,
    pub current: Option<SharedRandomValue>,
}

impl ConsensusSrvs {
    pub fn to_lines(&self) -> Vec<String> {
        render_srv_lines(self.previous.as_ref(), self.current.as_ref())
    }
}

/// Extract the SRV lines of a consensus document.
pub fn parse_consensus<'a>(lines: impl IntoIterator<Item = &'a str>) -> ConsensusSrvs {
    let mut srvs = ConsensusSrvs::default();
    for line in lines {
        let mut fields = line.split_whitespace();
        let keyword = fields.next();
        let args: Vec<&str> = fields.collect();
        let slot = match keyword {
            Some(PREVIOUS_SRV_KEYWORD) => &mut srvs.previous,
            Some(CURRENT_SRV_KEYWORD) => &mut srvs.current,
            _ => continue,
        };
        match parse_srv_args(&args) {
            Ok(srv) => *slot = Some(srv),
            Err(e) => info!(error = %e, "skipping SRV line in consensus"),
        }
    }
    srvs
}

#[cfg(test)]
mod tests {
    use super::*;
    use srand_crypto::{CryptoError, RandomSource};
    use srand_types::Timestamp;

    struct FixedRandom(u8);

    impl RandomSource for FixedRandom {
        fn fill_bytes(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
            buf.fill(self.0);
            Ok(())
        }
    }

    fn commit_for(id: u8) -> Commit {
        Commit::generate(Timestamp::new(86_400), AuthorityId::new([id; 20]), &FixedRandom(id))
            .unwrap()
    }

    #[test]
    fn commit_phase_line_hides_reveal() {
        let commit = commit_for(1);
        let line = render_commit_line(&commit, Phase::Commit);
        let fields: Vec<&str> = line.split(' ').collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], COMMIT_KEYWORD);
        assert_eq!(fields[1], "1");
        assert_eq!(fields[2], "sha3-256");
        assert_eq!(fields[3], "01".repeat(20));
        assert_eq!(fields[4], commit.encoded_commit());
    }

    #[test]
    fn reveal_phase_line_carries_reveal() {
        let commit = commit_for(2);
        let line = render_commit_line(&commit, Phase::Reveal);
        assert!(line.ends_with(commit.encoded_reveal().unwrap()));
    }

    #[test]
    fn parse_commit_line_round_trips() {
        let commit = commit_for(3);
        let line = render_commit_line(&commit, Phase::Reveal);
        let info = parse_vote(*commit.authority_id(), [line.as_str()]);
        assert_eq!(info.commits.len(), 1);
        let parsed = &info.commits[0];
        assert_eq!(parsed.encoded_commit(), commit.encoded_commit());
        assert_eq!(parsed.encoded_reveal(), commit.encoded_reveal());
        parsed.verify_commit_and_reveal().unwrap();
    }

    #[test]
    fn parse_rejects_unknown_version_and_algorithm() {
        let commit = commit_for(4);
        let fpr = commit.authority_id().to_hex();
        let enc = commit.encoded_commit();
        assert!(matches!(
            parse_commit_args(&["2", "sha3-256", &fpr, enc]),
            Err(ProtocolError::UnsupportedVersionOrAlgorithm(_))
        ));
        assert!(matches!(
            parse_commit_args(&["1", "sha256", &fpr, enc]),
            Err(ProtocolError::UnsupportedVersionOrAlgorithm(_))
        ));
        assert!(parse_commit_args(&["1", "sha3-256", "XYZ", enc]).is_err());
        assert!(parse_commit_args(&["1", "sha3-256", &fpr]).is_err());
    }

    #[test]
    fn vote_parsing_skips_bad_lines() {
        let good = commit_for(5);
        let srv = SharedRandomValue::new(4, [8; 32]);
        let good_line = render_commit_line(&good, Phase::Commit);
        let srv_lines = render_srv_lines(None, Some(&srv));
        let lines = vec![
            "known-flags Authority Running",
            PARTICIPATE_KEYWORD,
            "shared-rand-commit 1 sha3-256 NOTHEX AAAA",
            good_line.as_str(),
            "shared-rand-previous-value twelve AAAA",
            srv_lines[0].as_str(),
        ];
        let info = parse_vote(AuthorityId::new([5; 20]), lines);
        assert!(info.participate);
        assert_eq!(info.commits.len(), 1);
        assert_eq!(info.previous_srv, None);
        assert_eq!(info.current_srv, Some(srv));
        assert_eq!(info.srv(true), Some(&srv));
    }

    #[test]
    fn vote_lines_are_sorted_and_parse_back() {
        let commits = [commit_for(9), commit_for(3), commit_for(6)];
        let srv = SharedRandomValue::new(2, [3; 32]);
        let lines = render_vote_lines(Phase::Commit, &commits, Some(&srv), None);
        assert_eq!(lines[0], PARTICIPATE_KEYWORD);
        assert_eq!(lines.len(), 5);
        let commit_lines = &lines[1..4];
        let mut sorted = commit_lines.to_vec();
        sorted.sort();
        assert_eq!(commit_lines, sorted.as_slice());
        assert!(lines[4].starts_with(PREVIOUS_SRV_KEYWORD));

        let info = parse_vote(AuthorityId::new([9; 20]), lines.iter().map(String::as_str));
        assert!(info.participate);
        assert_eq!(info.commits.len(), 3);
        assert!(info.commits.iter().all(|c| !c.has_reveal()));
        assert_eq!(info.previous_srv, Some(srv));
    }

    #[test]
    fn srv_lines_order_and_round_trip() {
        let prev = SharedRandomValue::new(7, [1; 32]);
        let cur = SharedRandomValue::new(9, [2; 32]);
        let lines = render_srv_lines(Some(&prev), Some(&cur));
        assert!(lines[0].starts_with(PREVIOUS_SRV_KEYWORD));
        assert!(lines[1].starts_with(CURRENT_SRV_KEYWORD));
        let parsed = parse_consensus(lines.iter().map(String::as_str));
        assert_eq!(parsed.previous, Some(prev));
        assert_eq!(parsed.current, Some(cur));
    }

    #[test]
    fn empty_consensus_has_no_srvs() {
        let parsed = parse_consensus(["network-status-version 3"]);
        assert_eq!(parsed, ConsensusSrvs::default());
        assert!(parsed.to_lines().is_empty());
    }
}
