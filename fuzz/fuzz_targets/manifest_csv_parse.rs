//! Fuzz target for pair manifest parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mlstac::manifest::from_manifest_slice;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = from_manifest_slice(data);
});
