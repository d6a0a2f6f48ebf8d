//! Fuzz target for YAML catalog configuration parsing.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mlstac::config::from_yaml_str;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    if let Ok(yaml) = std::str::from_utf8(data) {
        if let Ok(config) = from_yaml_str(yaml) {
            let _ = config.catalog_options("/fuzz/catalog.json");
            let _ = config.ml_options("/fuzz/ml/catalog.json");
        }
    }
});
