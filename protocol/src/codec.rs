//! Commit and reveal codec.
//!
//! Both payloads are a fixed 40-byte binary layout, 8-byte big-endian
//! timestamp followed by a 32-byte value, carried as padded standard base64.
//! Decoding is all-or-nothing: the text must not exceed the expected base64
//! width and must decode to exactly 40 bytes.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use srand_crypto::DIGEST256_LEN;
use srand_types::{SharedRandomValue, Timestamp};

use crate::ProtocolError;

/// Length of the random number an authority commits to.
pub const RANDOM_NUMBER_LEN: usize = 32;

/// Binary length of a commit payload: timestamp + hashed reveal.
pub const COMMIT_LEN: usize = 8 + DIGEST256_LEN;

/// Binary length of a reveal payload: timestamp + random number.
pub const REVEAL_LEN: usize = 8 + RANDOM_NUMBER_LEN;

/// Base64 width of an encoded commit.
pub const COMMIT_BASE64_LEN: usize = base64_len(COMMIT_LEN);

/// Base64 width of an encoded reveal.
pub const REVEAL_BASE64_LEN: usize = base64_len(REVEAL_LEN);

/// Base64 width of an encoded SRV value.
pub const SRV_BASE64_LEN: usize = base64_len(DIGEST256_LEN);

const fn base64_len(n: usize) -> usize {
    ((n + 2) / 3) * 4
}

fn encode_payload(ts: Timestamp, value: &[u8; 32]) -> String {
    let mut buf = [0u8; 40];
    buf[..8].copy_from_slice(&ts.as_secs().to_be_bytes());
    buf[8..].copy_from_slice(value);
    BASE64.encode(buf)
}

fn decode_payload(
    what: &str,
    encoded: &str,
    max_text_len: usize,
) -> Result<(Timestamp, [u8; 32]), ProtocolError> {
    if encoded.len() > max_text_len {
        return Err(ProtocolError::MalformedEncoding(format!(
            "{what} is {} characters, at most {max_text_len} expected",
            encoded.len()
        )));
    }
    let decoded = BASE64
        .decode(encoded)
        .map_err(|e| ProtocolError::MalformedEncoding(format!("{what} is not base64: {e}")))?;
    if decoded.len() != 40 {
        return Err(ProtocolError::MalformedEncoding(format!(
            "{what} decodes to {} bytes, expected 40",
            decoded.len()
        )));
    }
    let mut ts = [0u8; 8];
    ts.copy_from_slice(&decoded[..8]);
    let mut value = [0u8; 32];
    value.copy_from_slice(&decoded[8..]);
    Ok((Timestamp::new(u64::from_be_bytes(ts)), value))
}

/// Encode `commit_ts ‖ hashed_reveal`.
pub fn encode_commit(commit_ts: Timestamp, hashed_reveal: &[u8; 32]) -> String {
    encode_payload(commit_ts, hashed_reveal)
}

/// Decode an encoded commit into `(commit_ts, hashed_reveal)`.
pub fn decode_commit(encoded: &str) -> Result<(Timestamp, [u8; 32]), ProtocolError> {
    decode_payload("commit", encoded, COMMIT_BASE64_LEN)
}

/// Encode `reveal_ts ‖ random_number`.
pub fn encode_reveal(reveal_ts: Timestamp, random_number: &[u8; 32]) -> String {
    encode_payload(reveal_ts, random_number)
}

/// Decode an encoded reveal into `(reveal_ts, random_number)`.
pub fn decode_reveal(encoded: &str) -> Result<(Timestamp, [u8; 32]), ProtocolError> {
    decode_payload("reveal", encoded, REVEAL_BASE64_LEN)
}

/// Base64 of an SRV's value (the reveal count travels separately).
pub fn encode_srv_value(srv: &SharedRandomValue) -> String {
    BASE64.encode(srv.value())
}

/// Decode the base64 value field of an SRV line.
pub fn decode_srv_value(encoded: &str) -> Result<[u8; 32], ProtocolError> {
    if encoded.len() != SRV_BASE64_LEN {
        return Err(ProtocolError::MalformedEncoding(format!(
            "SRV value is {} characters, expected {SRV_BASE64_LEN}",
            encoded.len()
        )));
    }
    let decoded = BASE64
        .decode(encoded)
        .map_err(|e| ProtocolError::MalformedEncoding(format!("SRV value is not base64: {e}")))?;
    <[u8; 32]>::try_from(decoded.as_slice()).map_err(|_| {
        ProtocolError::MalformedEncoding(format!(
            "SRV value decodes to {} bytes, expected 32",
            decoded.len()
        ))
    })
}
