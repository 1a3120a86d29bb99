use proptest::prelude::*;

use srand_crypto::{CryptoError, RandomSource};
use srand_protocol::Commit;
use srand_types::{AuthorityDirectory, AuthorityId, Phase, Timestamp, ROUNDS_PER_PHASE};
use srand_vrf::{compute_srv, ProtocolClock};

struct SeedRandom([u8; 32]);

impl RandomSource for SeedRandom {
    fn fill_bytes(&self, buf: &mut [u8]) -> Result<(), CryptoError> {
        buf.copy_from_slice(&self.0[..buf.len()]);
        Ok(())
    }
}

struct Everyone;

impl AuthorityDirectory for Everyone {
    fn my_identity(&self) -> AuthorityId {
        AuthorityId::new([0; 20])
    }

    fn is_known_authority(&self, _id: &AuthorityId) -> bool {
        true
    }

    fn n_authorities(&self) -> usize {
        usize::MAX
    }
}

fn commits_from(seeds: &[[u8; 32]]) -> Vec<Commit> {
    seeds
        .iter()
        .enumerate()
        .map(|(i, seed)| {
            Commit::generate(
                Timestamp::new(86_400),
                AuthorityId::new([i as u8; 20]),
                &SeedRandom(*seed),
            )
            .unwrap()
        })
        .collect()
}

proptest! {
    /// The phase pattern repeats every protocol run.
    #[test]
    fn phase_is_periodic(t in 0u64..4_000_000_000, interval in 1u64..7200) {
        let clock = ProtocolClock::new(interval);
        let run = clock.protocol_run_duration();
        prop_assert_eq!(
            clock.phase_of(Timestamp::new(t)),
            clock.phase_of(Timestamp::new(t + run))
        );
    }

    /// Half a run later the phase is always the other one.
    #[test]
    fn phase_flips_after_half_a_run(t in 0u64..4_000_000_000, interval in 1u64..7200) {
        let clock = ProtocolClock::new(interval);
        let half = ROUNDS_PER_PHASE * interval;
        let here = clock.phase_of(Timestamp::new(t));
        let there = clock.phase_of(Timestamp::new(t + half));
        prop_assert_ne!(here, there);
        prop_assert!(here == Phase::Commit || there == Phase::Commit);
    }

    /// State expiry always lands on the next protocol run boundary.
    #[test]
    fn expiry_is_run_aligned(t in 0u64..4_000_000_000, interval in 1u64..7200) {
        let clock = ProtocolClock::new(interval);
        let now = Timestamp::new(t);
        let expiry = clock.state_expiry(now);
        prop_assert!(expiry > now);
        prop_assert_eq!(expiry.as_secs() % clock.protocol_run_duration(), 0);
        prop_assert!(expiry.as_secs() - t <= clock.protocol_run_duration());
    }

    /// Any permutation of the same reveals yields the same SRV.
    #[test]
    fn srv_ignores_admission_order(
        seeds in prop::collection::vec(prop::array::uniform32(0u8..), 1..8),
        rotate in 0usize..8,
    ) {
        let commits = commits_from(&seeds);
        let mut shuffled = commits.clone();
        let len = shuffled.len();
        shuffled.rotate_left(rotate % len);
        shuffled.reverse();
        prop_assert_eq!(
            compute_srv(&commits, None, &Everyone),
            compute_srv(&shuffled, None, &Everyone)
        );
    }

    /// Changing one contributor's random number changes the SRV.
    #[test]
    fn srv_depends_on_every_reveal(
        seeds in prop::collection::vec(prop::array::uniform32(0u8..), 1..8),
        which in 0usize..8,
    ) {
        let commits = commits_from(&seeds);
        let idx = which % seeds.len();
        let mut altered_seeds = seeds.clone();
        altered_seeds[idx][0] ^= 0xff;
        let altered = commits_from(&altered_seeds);
        prop_assert_ne!(
            compute_srv(&commits, None, &Everyone),
            compute_srv(&altered, None, &Everyone)
        );
    }
}

#[test]
fn no_reveals_produce_no_value() {
    assert_eq!(compute_srv(&Vec::<Commit>::new(), None, &Everyone), None);
}
