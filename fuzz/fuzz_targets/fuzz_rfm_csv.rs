//! Fuzz target for RFM table parsing.
//!
//! Arbitrary text must either parse into a table or return an error, and a
//! parsed table must either validate or return an error. Neither may panic.

#![no_main]

use btyd_common::{RfmData, RfmTable};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(table) = RfmTable::from_csv_str(text) {
        if let Ok(rfm) = RfmData::from_table(&table) {
            assert!(rfm.recency().iter().zip(rfm.T()).all(|(r, t)| r <= t));
        }
    }
});
