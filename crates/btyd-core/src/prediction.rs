//! Prediction requests and their output matrices.

use btyd_common::{Error, Result, RfmTable};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::Quantity;

/// Default number of posterior draws when sampling the posterior.
pub const DEFAULT_POSTERIOR_DRAWS: usize = 100;

/// A request for one quantity of interest.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictRequest {
    pub quantity: Quantity,
    /// Horizon, in the same time units as the fit data.
    pub t: Option<f64>,
    /// Purchase count for [`Quantity::ProbabilityOfNPurchases`].
    pub n: Option<u64>,
    /// Evaluate at resampled posterior draws instead of posterior means.
    pub sample_posterior: bool,
    pub posterior_draws: usize,
    /// Customers to predict for; the fit-time data when absent.
    pub table: Option<RfmTable>,
}

impl PredictRequest {
    pub fn new(quantity: Quantity) -> Self {
        PredictRequest {
            quantity,
            t: None,
            n: None,
            sample_posterior: false,
            posterior_draws: DEFAULT_POSTERIOR_DRAWS,
            table: None,
        }
    }

    /// Request by quantity name (canonical or short alias).
    pub fn named(name: &str) -> Result<Self> {
        Ok(Self::new(name.parse()?))
    }

    pub fn with_t(mut self, t: f64) -> Self {
        self.t = Some(t);
        self
    }

    pub fn with_n(mut self, n: u64) -> Self {
        self.n = Some(n);
        self
    }

    /// Sample `draws` rows from the posterior.
    pub fn sample_posterior(mut self, draws: usize) -> Self {
        self.sample_posterior = true;
        self.posterior_draws = draws;
        self
    }

    pub fn with_table(mut self, table: RfmTable) -> Self {
        self.table = Some(table);
        self
    }

    /// Argument domain checks that need no model state.
    pub fn validate(&self) -> Result<()> {
        if let Some(t) = self.t {
            if !(t.is_finite() && t >= 0.0) {
                return Err(Error::invalid_input(
                    "t",
                    format!("horizon must be finite and non-negative, got {}", t),
                ));
            }
        }
        if self.sample_posterior && self.posterior_draws == 0 {
            return Err(Error::invalid_input(
                "posterior_draws",
                "must request at least one draw",
            ));
        }
        Ok(())
    }
}

/// Values of one quantity, row-major: one row per parameter draw, one
/// column per customer (a single column for population quantities).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Prediction {
    pub quantity: Quantity,
    pub rows: usize,
    pub cols: usize,
    pub values: Vec<f64>,
    /// Column labels for per-customer quantities.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub customer_ids: Vec<String>,
}

impl Prediction {
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        if i >= self.rows {
            return None;
        }
        self.values.get(i * self.cols..(i + 1) * self.cols)
    }

    /// Mean over draws for each column.
    pub fn mean_by_column(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.cols];
        for row in self.values.chunks(self.cols.max(1)) {
            for (s, v) in sums.iter_mut().zip(row) {
                *s += v;
            }
        }
        let rows = self.rows.max(1) as f64;
        sums.into_iter().map(|s| s / rows).collect()
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}
