//! The protocol phase.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::TypeError;

/// Which half of a protocol run a voting round belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Authorities publish commitments to their random numbers.
    Commit,
    /// Authorities disclose the random numbers they committed to.
    Reveal,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Commit => "commit",
            Self::Reveal => "reveal",
        }
    }

    /// Whether moving from `self` to `next` changes phase.
    pub fn is_transition(&self, next: Phase) -> bool {
        *self != next
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "commit" => Ok(Self::Commit),
            "reveal" => Ok(Self::Reveal),
            other => Err(TypeError::InvalidPhase(other.to_string())),
        }
    }
}
