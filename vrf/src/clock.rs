//! Protocol clock.
//!
//! Time is cut into rounds of one voting interval. A protocol run is
//! `ROUNDS_PER_PHASE * N_PHASES` consecutive rounds aligned on multiples of
//! the run length since the epoch; the first `ROUNDS_PER_PHASE` rounds are the
//! commit phase and the rest are the reveal phase. Everything here is a pure
//! function of its inputs.

use srand_types::{Phase, Timestamp, N_PHASES, ROUNDS_PER_PHASE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtocolClock {
    voting_interval: u64,
}

impl ProtocolClock {
    /// A clock for rounds of `voting_interval_secs`. Zero is treated as one
    /// second.
    pub fn new(voting_interval_secs: u64) -> Self {
        Self {
            voting_interval: voting_interval_secs.max(1),
        }
    }

    pub fn voting_interval(&self) -> u64 {
        self.voting_interval
    }

    pub fn rounds_per_run(&self) -> u64 {
        ROUNDS_PER_PHASE * N_PHASES
    }

    /// Length of a full protocol run in seconds.
    pub fn protocol_run_duration(&self) -> u64 {
        self.rounds_per_run() * self.voting_interval
    }

    /// Index of the round containing `t` within its protocol run.
    pub fn round_in_run(&self, t: Timestamp) -> u64 {
        (t.as_secs() / self.voting_interval) % self.rounds_per_run()
    }

    /// Phase of the round that starts at (or contains) `valid_after`.
    pub fn phase_of(&self, valid_after: Timestamp) -> Phase {
        if self.round_in_run(valid_after) < ROUNDS_PER_PHASE {
            Phase::Commit
        } else {
            Phase::Reveal
        }
    }

    /// Start of the round containing `now`.
    pub fn current_round_start(&self, now: Timestamp) -> Timestamp {
        Timestamp::new(now.as_secs() - now.as_secs() % self.voting_interval)
    }

    /// Start of the protocol run containing `now`.
    pub fn protocol_run_start(&self, now: Timestamp) -> Timestamp {
        let elapsed_rounds = self.round_in_run(now) * self.voting_interval;
        Timestamp::new(self.current_round_start(now).as_secs() - elapsed_rounds)
    }

    /// When a state prepared at `now` goes stale: the start of the round
    /// after the remaining rounds of the current run have elapsed.
    pub fn state_expiry(&self, now: Timestamp) -> Timestamp {
        let rounds_left = self.rounds_per_run() - self.round_in_run(now);
        self.current_round_start(now)
            .plus(rounds_left * self.voting_interval)
    }
}

/// Whether moving from `current` to `next` changes phase.
pub fn is_transition(current: Phase, next: Phase) -> bool {
    current.is_transition(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: u64 = 3600;
    const DAY: u64 = 24 * HOUR;

    #[test]
    fn hourly_rounds_make_daily_runs() {
        let clock = ProtocolClock::new(HOUR);
        assert_eq!(clock.protocol_run_duration(), DAY);
    }

    #[test]
    fn first_half_of_day_is_commit() {
        let clock = ProtocolClock::new(HOUR);
        let midnight = Timestamp::new(17_000 * DAY);
        assert_eq!(clock.phase_of(midnight), Phase::Commit);
        assert_eq!(clock.phase_of(midnight.plus(11 * HOUR)), Phase::Commit);
        assert_eq!(clock.phase_of(midnight.plus(11 * HOUR + 3599)), Phase::Commit);
        assert_eq!(clock.phase_of(midnight.plus(12 * HOUR)), Phase::Reveal);
        assert_eq!(clock.phase_of(midnight.plus(23 * HOUR)), Phase::Reveal);
        assert_eq!(clock.phase_of(midnight.plus(24 * HOUR)), Phase::Commit);
    }

    #[test]
    fn state_expiry_is_next_run_start() {
        let clock = ProtocolClock::new(HOUR);
        let midnight = Timestamp::new(17_000 * DAY);
        assert_eq!(clock.state_expiry(midnight), midnight.plus(DAY));
        assert_eq!(clock.state_expiry(midnight.plus(13 * HOUR + 20)), midnight.plus(DAY));
        assert_eq!(clock.state_expiry(midnight.plus(DAY - 1)), midnight.plus(DAY));
    }

    #[test]
    fn run_start_and_round_start() {
        let clock = ProtocolClock::new(HOUR);
        let midnight = Timestamp::new(17_000 * DAY);
        let t = midnight.plus(5 * HOUR + 42);
        assert_eq!(clock.current_round_start(t), midnight.plus(5 * HOUR));
        assert_eq!(clock.protocol_run_start(t), midnight);
        assert_eq!(clock.round_in_run(t), 5);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let clock = ProtocolClock::new(0);
        assert_eq!(clock.voting_interval(), 1);
        assert_eq!(clock.protocol_run_duration(), 24);
    }

    #[test]
    fn transition_is_inequality() {
        assert!(is_transition(Phase::Commit, Phase::Reveal));
        assert!(!is_transition(Phase::Reveal, Phase::Reveal));
    }
}
