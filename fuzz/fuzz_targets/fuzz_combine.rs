#![no_main]

use libfuzzer_sys::fuzz_target;
use shared_secret_encrypt::{ShamirShare, Share, SplitMode, codec};

// Arbitrary share sets must come back as Ok or Err, never a panic.
//
// Input layout: one byte share count, then per share one index byte and one
// length byte followed by that many data bytes. Indices of 0, repeats and
// ragged lengths are all left in on purpose.
fuzz_target!(|data: &[u8]| {
    let Some((&count, mut rest)) = data.split_first() else {
        return;
    };

    let mut shares = Vec::new();
    for _ in 0..(count % 32) {
        let [index, len, tail @ ..] = rest else {
            break;
        };
        let take = (*len as usize).min(tail.len());
        let (bytes, tail) = tail.split_at(take);
        rest = tail;

        // Share::new refuses index 0 and empty data; build through bytes so
        // both paths see the input
        let mut raw = vec![*index];
        raw.extend_from_slice(bytes);
        if let Ok(share) = Share::from_bytes(&raw) {
            shares.push(share);
        }
    }

    let sequential = ShamirShare::combine(&shares);
    let parallel = ShamirShare::combine_with_mode(&shares, SplitMode::Parallel);
    assert_eq!(sequential.is_ok(), parallel.is_ok());
    if let (Ok(a), Ok(b)) = (sequential, parallel) {
        assert_eq!(a, b);
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = codec::decode_shares(text.split('\n'));
    }
});
