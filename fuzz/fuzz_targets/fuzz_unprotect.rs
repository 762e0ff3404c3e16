#![no_main]

use std::sync::LazyLock;

use libfuzzer_sys::fuzz_target;
use shared_secret_encrypt::codec::ShareLink;
use shared_secret_encrypt::{SecretError, ShareProtector};

static PROTECTOR: LazyLock<ShareProtector> = LazyLock::new(ShareProtector::default);

// Arbitrary bundles and links must fail with the generic error, never panic
// and never leak which check tripped.
fuzz_target!(|data: &[u8]| {
    match PROTECTOR.unprotect(data, "fuzz-password") {
        Ok(_) | Err(SecretError::InvalidPasswordOrCorrupted) => {}
        Err(other) => panic!("unexpected error variant: {other:?}"),
    }

    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(link) = ShareLink::from_url(text) {
            let _ = link.to_protected();
        }
    }
});
