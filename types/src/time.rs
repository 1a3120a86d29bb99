//! Timestamp type used throughout the protocol.
//!
//! Timestamps are Unix epoch seconds (UTC). Commit and reveal payloads carry
//! them as 8-byte big-endian integers; the disk state carries them as
//! `YYYY-MM-DD HH:MM:SS`.

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::TypeError;

const ISO_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(u64);

impl Timestamp {
    /// The epoch (time zero).
    pub const EPOCH: Self = Self(0);

    pub fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Get the current system time as a `Timestamp`.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by `secs`, saturating.
    pub fn plus(&self, secs: u64) -> Self {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds elapsed since this timestamp (relative to `now`).
    pub fn elapsed_since(&self, now: Timestamp) -> u64 {
        now.0.saturating_sub(self.0)
    }

    /// Render as `YYYY-MM-DD HH:MM:SS` in UTC.
    pub fn to_iso8601(&self) -> String {
        let secs = i64::try_from(self.0).unwrap_or(i64::MAX);
        match DateTime::from_timestamp(secs, 0) {
            Some(dt) => dt.format(ISO_FORMAT).to_string(),
            None => format!("{}", self.0),
        }
    }

    /// Parse a `YYYY-MM-DD HH:MM:SS` UTC timestamp.
    pub fn parse_iso8601(s: &str) -> Result<Self, TypeError> {
        let parsed = NaiveDateTime::parse_from_str(s.trim(), ISO_FORMAT)
            .map_err(|_| TypeError::InvalidTimestamp(s.to_string()))?;
        let secs = parsed.and_utc().timestamp();
        u64::try_from(secs)
            .map(Self)
            .map_err(|_| TypeError::InvalidTimestamp(s.to_string()))
    }
}

/// Source of the current time.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_iso8601())
    }
}
