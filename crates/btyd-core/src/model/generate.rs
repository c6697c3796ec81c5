//! Synthetic RFM data for posterior-predictive checks.

use btyd_common::rfm::{FREQUENCY_COLUMN, ID_COLUMN, MONETARY_COLUMN, RECENCY_COLUMN, T_COLUMN};
use btyd_common::{Error, Result, RfmTable};
use rand::Rng;
use rand_distr::{Beta, Distribution, Exp, Gamma};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Simulated customers, column-oriented.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SyntheticTable {
    pub frequency: Vec<f64>,
    pub recency: Vec<f64>,
    #[serde(rename = "T")]
    pub t: Vec<f64>,
    /// Purchase rate drawn for each customer.
    pub lambda: Vec<f64>,
    /// Per-purchase dropout probability drawn for each customer.
    pub p: Vec<f64>,
    pub alive: Vec<bool>,
    pub customer_id: Vec<usize>,
}

impl SyntheticTable {
    pub const COLUMNS: [&'static str; 7] =
        ["frequency", "recency", "T", "lambda", "p", "alive", "customer_id"];

    pub fn len(&self) -> usize {
        self.customer_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customer_id.is_empty()
    }

    fn push(&mut self, row: SyntheticCustomer) {
        self.frequency.push(row.frequency);
        self.recency.push(row.recency);
        self.t.push(row.t);
        self.lambda.push(row.lambda);
        self.p.push(row.p);
        self.alive.push(row.alive);
        self.customer_id.push(row.customer_id);
    }

    /// Input table for a fit; monetary value is zero throughout.
    pub fn to_rfm_table(&self) -> RfmTable {
        RfmTable::new()
            .with_numbers(ID_COLUMN, self.customer_id.iter().map(|&i| i as f64).collect())
            .with_numbers(FREQUENCY_COLUMN, self.frequency.clone())
            .with_numbers(RECENCY_COLUMN, self.recency.clone())
            .with_numbers(T_COLUMN, self.t.clone())
            .with_numbers(MONETARY_COLUMN, vec![0.0; self.len()])
    }
}

struct SyntheticCustomer {
    frequency: f64,
    recency: f64,
    t: f64,
    lambda: f64,
    p: f64,
    alive: bool,
    customer_id: usize,
}

/// Simulate BG/NBD customers.
///
/// Each customer draws a dropout probability `p ~ Beta(a, b)` and a rate
/// `lambda ~ Gamma(r, scale = 1/alpha)`, then purchases at exponential
/// intervals until the window closes or, after a purchase, drops out with
/// probability `p`. Frequency counts distinct whole periods with a purchase.
pub fn simulate_beta_geo<R: Rng + ?Sized>(
    alpha: f64,
    r: f64,
    a: f64,
    b: f64,
    t: &[f64],
    size: usize,
    rng: &mut R,
) -> Result<SyntheticTable> {
    let dropout = Beta::new(a, b)
        .map_err(|e| Error::invalid_input("a, b", format!("invalid Beta({}, {}): {}", a, b, e)))?;
    let rate = Gamma::new(r, 1.0 / alpha).map_err(|e| {
        Error::invalid_input("r, alpha", format!("invalid Gamma({}, 1/{}): {}", r, alpha, e))
    })?;
    if let Some(bad) = t.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
        return Err(Error::invalid_input(
            "T",
            format!("observation windows must be positive, got {}", bad),
        ));
    }

    let mut table = SyntheticTable::default();
    for customer_id in 0..size {
        let window = if t.is_empty() { 1.0 } else { t[customer_id % t.len()] };
        let p = dropout.sample(rng);
        let lambda = rate.sample(rng);
        table.push(simulate_customer(customer_id, window, lambda, p, rng));
    }
    Ok(table)
}

fn simulate_customer<R: Rng + ?Sized>(
    customer_id: usize,
    window: f64,
    lambda: f64,
    p: f64,
    rng: &mut R,
) -> SyntheticCustomer {
    let mut times: Vec<f64> = Vec::new();
    let mut alive = true;

    if let Ok(gap) = Exp::new(lambda) {
        let mut clock = gap.sample(rng);
        while alive && clock < window {
            times.push(clock);
            clock += gap.sample(rng);
            alive = rng.random::<f64>() > p;
        }
    }

    let mut periods: Vec<u64> = times.iter().map(|s| s.floor() as u64).collect();
    periods.dedup();

    SyntheticCustomer {
        frequency: periods.len() as f64,
        recency: times.last().copied().unwrap_or(0.0),
        t: window,
        lambda,
        p,
        alive,
        customer_id,
    }
}
