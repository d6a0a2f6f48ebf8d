//! Fuzz target for STAC document parsing.
//!
//! This fuzzer feeds arbitrary byte sequences to the STAC document parser
//! and node conversion, checking for panics, crashes, or hangs.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mlstac::stac::fuzz_parse_document;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let _ = fuzz_parse_document(data);
});
