#![no_main]

use libfuzzer_sys::fuzz_target;
use srand_protocol::lines::{parse_consensus, parse_vote};
use srand_store::DiskState;
use srand_types::{AuthorityId, Timestamp};

// Vote lines, consensus lines and state files come from outside; none of the
// parsers may panic on them.
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);

    let info = parse_vote(AuthorityId::new([7; 20]), text.lines());
    for commit in &info.commits {
        let _ = commit.verify_commit_and_reveal();
    }
    let _ = parse_consensus(text.lines());
    let _ = DiskState::parse(&text, Timestamp::EPOCH);
});
