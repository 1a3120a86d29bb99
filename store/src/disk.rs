//! Versioned on-disk form of the protocol state.
//!
//! ```text
//! # Shared random state, regenerated on every change.
//! Version 1
//! ValidAfter 2016-01-01 00:00:00
//! ValidUntil 2016-01-02 00:00:00
//! Commit 1 sha3-256 <fingerprint> <encoded_commit>[ <encoded_reveal>]
//! SharedRandPreviousValue <num_reveals> <base64_srv>
//! SharedRandCurrentValue <num_reveals> <base64_srv>
//! ```
//!
//! The file is a mirror: it is rebuilt from memory before every write and
//! only read back at boot.

use srand_protocol::{lines, version, Commit, ProtocolError};
use srand_types::{SharedRandomValue, Timestamp, SR_PROTO_VERSION};
use tracing::{debug, info, warn};

use crate::StoreError;

/// File name of the state file inside the data directory.
pub const DEFAULT_STATE_FILE_NAME: &str = "sr-state";

const HEADER: &str = "# Shared random state, regenerated on every change. Do not edit.";

const KEY_VERSION: &str = "Version";
const KEY_VALID_AFTER: &str = "ValidAfter";
const KEY_VALID_UNTIL: &str = "ValidUntil";
const KEY_COMMIT: &str = "Commit";
const KEY_PREVIOUS_SRV: &str = "SharedRandPreviousValue";
const KEY_CURRENT_SRV: &str = "SharedRandCurrentValue";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiskState {
    pub version: u32,
    pub valid_after: Timestamp,
    pub valid_until: Timestamp,
    pub commits: Vec<Commit>,
    pub previous_srv: Option<SharedRandomValue>,
    pub current_srv: Option<SharedRandomValue>,
}

impl DiskState {
    pub fn new(valid_after: Timestamp, valid_until: Timestamp) -> Self {
        Self {
            version: SR_PROTO_VERSION,
            valid_after,
            valid_until,
            commits: Vec::new(),
            previous_srv: None,
            current_srv: None,
        }
    }

    /// Render the state file. Every commit is written with whatever reveal
    /// it carries, so our own reveal survives a restart mid-run.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(HEADER);
        out.push('\n');
        out.push_str(&format!("{KEY_VERSION} {}\n", self.version));
        out.push_str(&format!("{KEY_VALID_AFTER} {}\n", self.valid_after.to_iso8601()));
        out.push_str(&format!("{KEY_VALID_UNTIL} {}\n", self.valid_until.to_iso8601()));
        for commit in &self.commits {
            out.push_str(&format!("{KEY_COMMIT} {}\n", lines::commit_args(commit, true)));
        }
        if let Some(srv) = &self.previous_srv {
            out.push_str(&format!("{KEY_PREVIOUS_SRV} {}\n", lines::srv_args(srv)));
        }
        if let Some(srv) = &self.current_srv {
            out.push_str(&format!("{KEY_CURRENT_SRV} {}\n", lines::srv_args(srv)));
        }
        out
    }

    /// Parse and validate a state file read at boot.
    ///
    /// Returns `Ok(None)` when the file is well-formed but no longer usable
    /// (expired, or an empty validity window): the caller starts fresh.
    /// Structural failures are [`StoreError::StateCorrupt`]. Individual
    /// commits that fail to decode are skipped.
    pub fn parse(text: &str, now: Timestamp) -> Result<Option<Self>, StoreError> {
        let mut version = None;
        let mut valid_after = None;
        let mut valid_until = None;
        let mut commits = Vec::new();
        let mut previous_srv = None;
        let mut current_srv = None;

        for (lineno, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            let value = value.trim();
            match key {
                KEY_VERSION => version = Some(parse_disk_version(value)?),
                KEY_VALID_AFTER => valid_after = Some(parse_time(key, value)?),
                KEY_VALID_UNTIL => valid_until = Some(parse_time(key, value)?),
                KEY_COMMIT => {
                    let args: Vec<&str> = value.split_whitespace().collect();
                    if args.len() < 4 {
                        return Err(StoreError::StateCorrupt(format!(
                            "line {}: commit has {} arguments, at least 4 expected",
                            lineno + 1,
                            args.len()
                        )));
                    }
                    match lines::parse_commit_args(&args) {
                        Ok(mut commit) => {
                            commit.mark_valid();
                            commits.push(commit);
                        }
                        Err(e) => warn!(line = lineno + 1, error = %e, "skipping commit in state file"),
                    }
                }
                KEY_PREVIOUS_SRV => previous_srv = Some(parse_srv(KEY_PREVIOUS_SRV, value)?),
                KEY_CURRENT_SRV => current_srv = Some(parse_srv(KEY_CURRENT_SRV, value)?),
                other => debug!(key = other, "ignoring unknown key in state file"),
            }
        }

        let version = version.ok_or_else(|| missing(KEY_VERSION))?;
        let valid_after = valid_after.ok_or_else(|| missing(KEY_VALID_AFTER))?;
        let valid_until = valid_until.ok_or_else(|| missing(KEY_VALID_UNTIL))?;

        if valid_after >= valid_until {
            info!(
                valid_after = %valid_after,
                valid_until = %valid_until,
                "state file has an empty validity window, ignoring it"
            );
            return Ok(None);
        }
        if valid_until < now {
            info!(valid_until = %valid_until, "state file has expired, ignoring it");
            return Ok(None);
        }

        Ok(Some(Self {
            version,
            valid_after,
            valid_until,
            commits,
            previous_srv,
            current_srv,
        }))
    }
}

fn missing(key: &str) -> StoreError {
    StoreError::StateCorrupt(format!("missing {key} line"))
}

fn parse_disk_version(value: &str) -> Result<u32, StoreError> {
    version::parse_version(value).map_err(corrupt(KEY_VERSION))
}

fn parse_time(key: &str, value: &str) -> Result<Timestamp, StoreError> {
    Timestamp::parse_iso8601(value)
        .map_err(|e| StoreError::StateCorrupt(format!("{key}: {e}")))
}

fn parse_srv(key: &'static str, value: &str) -> Result<SharedRandomValue, StoreError> {
    let args: Vec<&str> = value.split_whitespace().collect();
    lines::parse_srv_args(&args).map_err(corrupt(key))
}

fn corrupt(key: &'static str) -> impl Fn(ProtocolError) -> StoreError {
    move |e| StoreError::StateCorrupt(format!("{key}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use srand_crypto::{CryptoError, RandomSource};
    use srand_protocol::DigestAlgorithm;
    use srand_types::AuthorityId;

    const DAY: u64 = 86_400;
    const T0: u64 = 1_451_606_400;

    struct FixedRandom(u8);

    impl RandomSource for FixedRandom {
        fn fill_bytes(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
            buf.fill(self.0);
            Ok(())
        }
    }

    fn sample() -> DiskState {
        let ours = Commit::generate(Timestamp::new(T0), AuthorityId::new([1; 20]), &FixedRandom(1))
            .unwrap();
        let peer = Commit::generate(Timestamp::new(T0), AuthorityId::new([2; 20]), &FixedRandom(2))
            .unwrap()
            .commitment_only();
        let mut state = DiskState::new(Timestamp::new(T0), Timestamp::new(T0 + DAY));
        state.commits = vec![ours, peer];
        state.previous_srv = Some(SharedRandomValue::new(3, [4; 32]));
        state.current_srv = Some(SharedRandomValue::new(5, [6; 32]));
        state
    }

    #[test]
    fn text_layout() {
        let text = sample().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with('#'));
        assert_eq!(lines[1], "Version 1");
        assert_eq!(lines[2], "ValidAfter 2016-01-01 00:00:00");
        assert_eq!(lines[3], "ValidUntil 2016-01-02 00:00:00");
        assert!(lines[4].starts_with("Commit 1 sha3-256 0101"));
        assert_eq!(lines[4].split(' ').count(), 6);
        assert_eq!(lines[5].split(' ').count(), 5);
        assert!(lines[6].starts_with("SharedRandPreviousValue 3 "));
        assert!(lines[7].starts_with("SharedRandCurrentValue 5 "));
    }

    #[test]
    fn parse_restores_state_and_marks_commits_valid() {
        let original = sample();
        let parsed = DiskState::parse(&original.to_text(), Timestamp::new(T0 + 10))
            .unwrap()
            .unwrap();
        assert_eq!(parsed.valid_after, original.valid_after);
        assert_eq!(parsed.valid_until, original.valid_until);
        assert_eq!(parsed.previous_srv, original.previous_srv);
        assert_eq!(parsed.current_srv, original.current_srv);
        assert_eq!(parsed.commits.len(), 2);
        assert!(parsed.commits.iter().all(Commit::is_valid));
        assert_eq!(parsed.commits[0].encoded_reveal(), original.commits[0].encoded_reveal());
        assert!(!parsed.commits[1].has_reveal());
    }

    #[test]
    fn expired_file_is_absent() {
        let text = sample().to_text();
        assert!(DiskState::parse(&text, Timestamp::new(T0 + 2 * DAY)).unwrap().is_none());
    }

    #[test]
    fn empty_window_is_absent() {
        let state = DiskState::new(Timestamp::new(T0), Timestamp::new(T0));
        assert!(DiskState::parse(&state.to_text(), Timestamp::new(T0 - 5)).unwrap().is_none());
    }

    #[test]
    fn bad_version_is_corrupt() {
        for v in ["0", "2", "one"] {
            let text = sample().to_text().replace("Version 1", &format!("Version {v}"));
            assert!(matches!(
                DiskState::parse(&text, Timestamp::new(T0)),
                Err(StoreError::StateCorrupt(_))
            ));
        }
    }

    #[test]
    fn missing_header_keys_are_corrupt() {
        let text = sample().to_text();
        for key in [KEY_VERSION, KEY_VALID_AFTER, KEY_VALID_UNTIL] {
            let stripped: String = text
                .lines()
                .filter(|l| !l.starts_with(key))
                .map(|l| format!("{l}\n"))
                .collect();
            assert!(
                matches!(
                    DiskState::parse(&stripped, Timestamp::new(T0)),
                    Err(StoreError::StateCorrupt(_))
                ),
                "{key}"
            );
        }
    }

    #[test]
    fn short_commit_line_is_corrupt() {
        let empty = DiskState::new(Timestamp::new(T0), Timestamp::new(T0 + DAY));
        let text = format!("{}Commit 1 sha3-256\n", empty.to_text());
        assert!(matches!(
            DiskState::parse(&text, Timestamp::new(T0)),
            Err(StoreError::StateCorrupt(_))
        ));
    }

    #[test]
    fn undecodable_commit_is_skipped() {
        let fpr = AuthorityId::new([9; 20]).to_hex();
        let text = format!("{}Commit 1 sha3-256 {fpr} notbase64\n", sample().to_text());
        let parsed = DiskState::parse(&text, Timestamp::new(T0)).unwrap().unwrap();
        assert_eq!(parsed.commits.len(), 2);
    }

    #[test]
    fn bad_srv_line_is_corrupt() {
        let text = format!("{}SharedRandCurrentValue 5 tooshort\n", sample().to_text());
        assert!(matches!(
            DiskState::parse(&text, Timestamp::new(T0)),
            Err(StoreError::StateCorrupt(_))
        ));
    }

    #[test]
    fn comments_blank_lines_and_unknown_keys_are_ignored() {
        let text = format!("\n# note\n{}SomethingNew 42\n\n", sample().to_text());
        let parsed = DiskState::parse(&text, Timestamp::new(T0)).unwrap().unwrap();
        assert_eq!(parsed.commits.len(), 2);
        assert_eq!(parsed.commits[0].alg(), DigestAlgorithm::Sha3_256);
    }
}
