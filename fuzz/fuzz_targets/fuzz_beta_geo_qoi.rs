//! Fuzz target for the BG/NBD closed forms.
//!
//! Feeds arbitrary positive parameters and customer histories through every
//! quantity; the formulas may return non-finite values at the extremes but
//! must not panic or loop.

#![no_main]

use arbitrary::Arbitrary;
use btyd_core::BetaGeoParams;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    alpha: f64,
    r: f64,
    a: f64,
    b: f64,
    x: u8,
    t_x: f64,
    t: f64,
    horizon: f64,
    n: u8,
}

fn positive(v: f64) -> Option<f64> {
    (v.is_finite() && v > 0.0 && v < 1e6).then_some(v)
}

fuzz_target!(|input: Input| {
    let (Some(alpha), Some(r), Some(a), Some(b), Some(t), Some(horizon)) = (
        positive(input.alpha),
        positive(input.r),
        positive(input.a),
        positive(input.b),
        positive(input.t),
        positive(input.horizon),
    ) else {
        return;
    };
    let x = f64::from(input.x);
    let t_x = if x == 0.0 {
        0.0
    } else {
        input.t_x.abs().min(t)
    };
    if !t_x.is_finite() {
        return;
    }

    let p = BetaGeoParams { alpha, r, a, b };
    let _ = p.customer_log_likelihood(x, t_x, t);
    let alive = p.alive_probability(x, t_x, t);
    assert!(alive.is_nan() || (0.0..=1.0).contains(&alive));
    let _ = p.conditional_expected_purchases(horizon, x, t_x, t);
    let _ = p.expected_purchases(horizon);
    let _ = p.probability_of_n_purchases(horizon, u64::from(input.n));
});
