//! Fuzz target for posterior snapshot decoding and validation.

#![no_main]

use btyd_core::posterior::PosteriorSnapshot;
use btyd_core::PosteriorStore;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(snapshot) = serde_json::from_slice::<PosteriorSnapshot>(data) else {
        return;
    };
    if snapshot.validate("BetaGeoModel").is_ok() {
        let store = PosteriorStore::from_samples("BetaGeoModel", snapshot.to_samples());
        if let Ok(store) = store {
            let _ = store.point_estimates();
        }
    }
});
