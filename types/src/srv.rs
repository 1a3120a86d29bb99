//! Shared random values.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A shared random value: the digest produced at the end of a protocol run
/// together with the number of reveals that went into it.
///
/// Ordering compares the value bytes first, so sorting a list of SRVs groups
/// identical values together.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SharedRandomValue {
    value: [u8; 32],
    num_reveals: u64,
}

impl SharedRandomValue {
    pub fn new(num_reveals: u64, value: [u8; 32]) -> Self {
        Self { value, num_reveals }
    }

    pub fn num_reveals(&self) -> u64 {
        self.num_reveals
    }

    pub fn value(&self) -> &[u8; 32] {
        &self.value
    }
}

impl fmt::Debug for SharedRandomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SharedRandomValue({} reveals, {})",
            self.num_reveals,
            hex::encode(&self.value[..4])
        )
    }
}

impl fmt::Display for SharedRandomValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.num_reveals, hex::encode(self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_covers_both_fields() {
        let a = SharedRandomValue::new(3, [7; 32]);
        assert_eq!(a, SharedRandomValue::new(3, [7; 32]));
        assert_ne!(a, SharedRandomValue::new(4, [7; 32]));
        assert_ne!(a, SharedRandomValue::new(3, [8; 32]));
    }

    #[test]
    fn sort_groups_by_value() {
        let mut srvs = vec![
            SharedRandomValue::new(1, [9; 32]),
            SharedRandomValue::new(5, [1; 32]),
            SharedRandomValue::new(1, [9; 32]),
        ];
        srvs.sort();
        assert_eq!(srvs[0].value(), &[1; 32]);
        assert_eq!(srvs[1], srvs[2]);
    }
}
