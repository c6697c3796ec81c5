//! Fuzz target for btyd.json configuration parsing.

#![no_main]

use btyd_config::BtydConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    // Parsing and validation should never panic, only return an error
    let _ = BtydConfig::from_json_str(text);
});
