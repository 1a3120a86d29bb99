use proptest::prelude::*;

use srand_types::{AuthorityId, SharedRandomValue, Timestamp};

proptest! {
    /// Fingerprint rendering parses back to the same identity.
    #[test]
    fn authority_hex_roundtrip(bytes in prop::array::uniform20(0u8..)) {
        let id = AuthorityId::new(bytes);
        prop_assert_eq!(AuthorityId::from_hex(&id.to_hex()).unwrap(), id);
    }

    /// ISO-8601 rendering parses back to the same second.
    #[test]
    fn iso8601_roundtrip(secs in 0u64..4_102_444_800) {
        let ts = Timestamp::new(secs);
        prop_assert_eq!(Timestamp::parse_iso8601(&ts.to_iso8601()).unwrap(), ts);
    }

    /// Two SRVs are equal only when both value and reveal count agree.
    #[test]
    fn srv_equality_is_fieldwise(
        a in prop::array::uniform32(0u8..),
        b in prop::array::uniform32(0u8..),
        n in 0u64..100,
    ) {
        let x = SharedRandomValue::new(n, a);
        let y = SharedRandomValue::new(n, b);
        prop_assert_eq!(x == y, a == b);
    }
}
