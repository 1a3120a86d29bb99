#![no_main]

use libfuzzer_sys::fuzz_target;
use srand_protocol::codec;

// Decoding arbitrary text must never panic, and whatever decodes must
// encode back to the same payload.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok((ts, hashed)) = codec::decode_commit(text) {
        assert_eq!(codec::encode_commit(ts, &hashed), text);
    }
    if let Ok((ts, random)) = codec::decode_reveal(text) {
        assert_eq!(codec::encode_reveal(ts, &random), text);
    }
    let _ = codec::decode_srv_value(text);
});
