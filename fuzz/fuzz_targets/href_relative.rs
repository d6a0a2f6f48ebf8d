//! Fuzz target for relative href computation.
//!
//! A link written relative to one absolute location must resolve back to
//! the normalized target.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mlstac::catalog::href::{normalize, relative_href, resolve_relative};

fuzz_target!(|input: (&str, &str)| {
    let (from, to) = input;
    if from.len() > 4096 || to.len() > 4096 {
        return;
    }
    if !from.starts_with('/') || !to.starts_with('/') {
        return;
    }

    let relative = relative_href(from, to);
    assert_eq!(resolve_relative(from, &relative), normalize(to));
});
