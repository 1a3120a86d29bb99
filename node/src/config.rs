//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use srand_store::DEFAULT_STATE_FILE_NAME;
use srand_vrf::ProtocolClock;

use crate::{LogFormat, NodeError};

/// Configuration for a shared random authority.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory holding the state file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Name of the state file inside `data_dir`.
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Length of one voting round in seconds.
    #[serde(default = "default_voting_interval")]
    pub voting_interval_secs: u64,

    /// Whether this authority takes part in the protocol. When false it
    /// publishes nothing but still follows the consensus SRVs.
    #[serde(default = "default_true")]
    pub participate: bool,

    /// Whether the state is mirrored to disk. When false it lives in memory
    /// only and is lost on restart.
    #[serde(default = "default_true")]
    pub save_to_disk: bool,

    /// Our own authority fingerprint, 40 hex characters.
    #[serde(default)]
    pub identity: Option<String>,

    /// Fingerprints of every recognized authority.
    #[serde(default)]
    pub authorities: Vec<String>,

    /// Agreements a fresh SRV needs to enter the consensus. Defaults to two
    /// thirds of the authorities.
    #[serde(default)]
    pub agreement_threshold: Option<usize>,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./srand_data")
}

fn default_state_file() -> String {
    DEFAULT_STATE_FILE_NAME.to_string()
}

fn default_voting_interval() -> u64 {
    3_600
}

fn default_true() -> bool {
    true
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Full path of the state file.
    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join(&self.state_file)
    }

    pub fn protocol_clock(&self) -> ProtocolClock {
        ProtocolClock::new(self.voting_interval_secs)
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        match self.log_format.as_str() {
            "human" => Ok(LogFormat::Human),
            "json" => Ok(LogFormat::Json),
            other => Err(NodeError::Config(format!("unknown log format {other:?}"))),
        }
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            state_file: default_state_file(),
            voting_interval_secs: default_voting_interval(),
            participate: default_true(),
            save_to_disk: default_true(),
            identity: None,
            authorities: Vec::new(),
            agreement_threshold: None,
            log_format: default_log_format(),
            log_level: default_log_level(),
        }
    }
}
