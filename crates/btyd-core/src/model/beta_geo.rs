//! BG/NBD (beta-geometric / negative binomial) model.
//!
//! While alive, a customer purchases as a Poisson process with rate
//! `lambda ~ Gamma(r, alpha)`; after each purchase they drop out with
//! probability `p ~ Beta(a, b)`. The beta prior is reparameterized as
//! `a = phi·kappa`, `b = (1 - phi)·kappa` with `phi` uniform and `kappa`
//! Pareto.
//!
//! Everything is evaluated in log space where a direct product would
//! overflow. Zero-frequency customers take explicit branches wherever a
//! formula would otherwise divide by `b + x - 1` or multiply `0 · log 0`.

use btyd_common::{Error, Result, RfmData};
use btyd_config::hyperpriors::{
    ALPHA_PRIOR_ALPHA, ALPHA_PRIOR_BETA, KAPPA_PRIOR_ALPHA, KAPPA_PRIOR_M, PHI_PRIOR_LOWER,
    PHI_PRIOR_UPPER, R_PRIOR_ALPHA, R_PRIOR_BETA,
};
use btyd_config::HyperpriorConfig;
use btyd_math::{
    beta_ratio, expit, lgamma, log_add_exp, log_beta, log_factorial, signed_ln_hyp2f1,
};
use rand::Rng;

use super::contract::BehaviorModel;
use super::generate::{simulate_beta_geo, SyntheticTable};
use super::params::ParamVector;
use super::quantity::{QuantityArgs, QuantityTable};
use crate::inference::{Derivation, Prior, PriorGraph};

/// The BG/NBD model with its hyperpriors.
#[derive(Debug, Clone, PartialEq)]
pub struct BetaGeoModel {
    hyperpriors: HyperpriorConfig,
}

impl BetaGeoModel {
    pub fn new(hyperpriors: HyperpriorConfig) -> Self {
        BetaGeoModel { hyperpriors }
    }
}

impl Default for BetaGeoModel {
    fn default() -> Self {
        BetaGeoModel::new(HyperpriorConfig::beta_geo_default())
    }
}

/// Validated BG/NBD parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaGeoParams {
    pub alpha: f64,
    pub r: f64,
    pub a: f64,
    pub b: f64,
}

impl BetaGeoParams {
    pub fn from_vector(params: &ParamVector) -> Result<Self> {
        let p = BetaGeoParams {
            alpha: params.get("alpha")?,
            r: params.get("r")?,
            a: params.get("a")?,
            b: params.get("b")?,
        };
        for (name, value) in [("alpha", p.alpha), ("r", p.r), ("a", p.a), ("b", p.b)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::invalid_input(
                    name,
                    format!("BG/NBD parameters must be positive and finite, got {}", value),
                ));
            }
        }
        Ok(p)
    }

    /// Log-likelihood of one customer with `x` repeat purchases, the last
    /// at `t_x`, observed for `t`.
    pub fn customer_log_likelihood(&self, x: f64, t_x: f64, t: f64) -> f64 {
        let BetaGeoParams { alpha, r, a, b } = *self;
        let d1 = lgamma(r + x) - lgamma(r) + lgamma(a + b) + lgamma(b + x)
            - lgamma(b)
            - lgamma(a + b + x);
        let d2 = r * alpha.ln() - (r + x) * (alpha + t_x).ln();
        let ln_c3 = (r + x) * ((alpha + t_x) / (alpha + t)).ln();
        let tail = if x > 0.0 {
            log_add_exp(ln_c3, (a / (b + x - 1.0)).ln())
        } else {
            ln_c3
        };
        d1 + d2 + tail
    }

    /// Probability the customer is still alive at the end of their window.
    pub fn alive_probability(&self, x: f64, t_x: f64, t: f64) -> f64 {
        if x == 0.0 {
            return 1.0;
        }
        let BetaGeoParams { alpha, r, a, b } = *self;
        let log_div = (r + x) * ((alpha + t) / (alpha + t_x)).ln() + (a / (b + x - 1.0)).ln();
        expit(-log_div)
    }

    /// Expected purchases in the next `horizon` periods given the history.
    pub fn conditional_expected_purchases(&self, horizon: f64, x: f64, t_x: f64, t: f64) -> f64 {
        let BetaGeoParams { alpha, r, a, b } = *self;
        let z = horizon / (alpha + t + horizon);
        let (sign, ln_hyp) = signed_ln_hyp2f1(r + x, b + x, a + b + x - 1.0, z);

        let lead = (a + b + x - 1.0) / (a - 1.0);
        let decay = sign * (ln_hyp + (r + x) * ((alpha + t) / (alpha + horizon + t)).ln()).exp();
        let numerator = lead * (1.0 - decay);

        let denominator = if x > 0.0 {
            1.0 + a / (b + x - 1.0) * ((alpha + t) / (alpha + t_x)).powf(r + x)
        } else {
            1.0
        };
        numerator / denominator
    }

    /// Expected purchases in `horizon` periods for a random new customer.
    pub fn expected_purchases(&self, horizon: f64) -> f64 {
        let BetaGeoParams { alpha, r, a, b } = *self;
        let (sign, ln_hyp) = signed_ln_hyp2f1(r, b, a + b - 1.0, horizon / (alpha + horizon));
        let decay = sign * (ln_hyp + r * (alpha / (alpha + horizon)).ln()).exp();
        (a + b - 1.0) / (a - 1.0) * (1.0 - decay)
    }

    /// Probability of exactly `n` purchases in `horizon` periods for a
    /// random new customer.
    pub fn probability_of_n_purchases(&self, horizon: f64, n: u64) -> f64 {
        let BetaGeoParams { alpha, r, a, b } = *self;
        let nf = n as f64;
        let ln_stay = (alpha / (alpha + horizon)).ln();
        let ln_go = (horizon / (alpha + horizon)).ln();

        let ln_first = log_beta(a, b + nf) - log_beta(a, b) + nbd_log_coefficient(r, n)
            + r * ln_stay
            + power_term(n, ln_go);
        let first = ln_first.exp();

        if n == 0 {
            return first;
        }

        let partial: f64 = (0..n)
            .map(|j| (nbd_log_coefficient(r, j) + power_term(j, ln_go) + r * ln_stay).exp())
            .sum();
        // The partial NBD mass can round past 1 once it has absorbed nearly all
        // of the distribution; the tail it leaves is never negative.
        let second = beta_ratio(a + 1.0, b + nf - 1.0, a, b) * (1.0 - partial).max(0.0);
        first + second
    }
}

/// `log Γ(r+j) / (Γ(r) · j!)`
fn nbd_log_coefficient(r: f64, j: u64) -> f64 {
    lgamma(r + j as f64) - lgamma(r) - log_factorial(j)
}

/// `j · ln_z`, with `0 · ln 0` taken as zero.
fn power_term(j: u64, ln_z: f64) -> f64 {
    if j == 0 {
        0.0
    } else {
        j as f64 * ln_z
    }
}

impl BehaviorModel for BetaGeoModel {
    const NAME: &'static str = "BetaGeoModel";
    const PARAMETER_NAMES: &'static [&'static str] = &["alpha", "r", "a", "b"];

    fn from_hyperpriors(hyperpriors: HyperpriorConfig) -> Self {
        BetaGeoModel::new(hyperpriors)
    }

    fn hyperpriors(&self) -> &HyperpriorConfig {
        &self.hyperpriors
    }

    fn declare_priors(&self) -> Result<PriorGraph> {
        let h = &self.hyperpriors;
        let graph = PriorGraph::new()
            .free(
                "alpha",
                Prior::Weibull {
                    shape: h.require(ALPHA_PRIOR_ALPHA)?,
                    scale: h.require(ALPHA_PRIOR_BETA)?,
                },
            )
            .free(
                "r",
                Prior::Weibull {
                    shape: h.require(R_PRIOR_ALPHA)?,
                    scale: h.require(R_PRIOR_BETA)?,
                },
            )
            .free(
                "phi",
                Prior::Uniform {
                    lower: h.require(PHI_PRIOR_LOWER)?,
                    upper: h.require(PHI_PRIOR_UPPER)?,
                },
            )
            .free(
                "kappa",
                Prior::Pareto {
                    alpha: h.require(KAPPA_PRIOR_ALPHA)?,
                    m: h.require(KAPPA_PRIOR_M)?,
                },
            )
            .derived(
                "a",
                Derivation::Product {
                    x: "phi".into(),
                    y: "kappa".into(),
                },
            )
            .derived(
                "b",
                Derivation::ComplementProduct {
                    x: "phi".into(),
                    y: "kappa".into(),
                },
            );
        graph.validate()?;
        Ok(graph)
    }

    fn log_likelihood(&self, data: &RfmData, params: &ParamVector) -> Result<f64> {
        let p = BetaGeoParams::from_vector(params)?;
        Ok(data
            .frequency()
            .iter()
            .zip(data.recency())
            .zip(data.T())
            .map(|((&x, &t_x), &t)| p.customer_log_likelihood(x, t_x, t))
            .sum())
    }

    fn quantities_of_interest(&self) -> QuantityTable<Self> {
        QuantityTable {
            alive_probability,
            conditional_expected_purchases,
            expected_purchases,
            probability_of_n_purchases,
        }
    }

    fn generate_rfm_data<R: Rng + ?Sized>(
        &self,
        params: &ParamVector,
        t: &[f64],
        size: usize,
        rng: &mut R,
    ) -> Result<SyntheticTable> {
        let p = BetaGeoParams::from_vector(params)?;
        simulate_beta_geo(p.alpha, p.r, p.a, p.b, t, size, rng)
    }
}

fn per_customer(
    params: &ParamVector,
    args: &QuantityArgs<'_>,
    f: impl Fn(&BetaGeoParams, f64, f64, f64) -> f64,
) -> Result<Vec<f64>> {
    let p = BetaGeoParams::from_vector(params)?;
    let data = args.data()?;
    Ok(data
        .frequency()
        .iter()
        .zip(data.recency())
        .zip(data.T())
        .map(|((&x, &t_x), &t)| f(&p, x, t_x, t))
        .collect())
}

fn alive_probability(
    _model: &BetaGeoModel,
    params: &ParamVector,
    args: &QuantityArgs<'_>,
) -> Result<Vec<f64>> {
    per_customer(params, args, |p, x, t_x, t| p.alive_probability(x, t_x, t))
}

fn conditional_expected_purchases(
    _model: &BetaGeoModel,
    params: &ParamVector,
    args: &QuantityArgs<'_>,
) -> Result<Vec<f64>> {
    let horizon = args.t()?;
    per_customer(params, args, |p, x, t_x, t| {
        p.conditional_expected_purchases(horizon, x, t_x, t)
    })
}

fn expected_purchases(
    _model: &BetaGeoModel,
    params: &ParamVector,
    args: &QuantityArgs<'_>,
) -> Result<Vec<f64>> {
    let horizon = args.t()?;
    let p = BetaGeoParams::from_vector(params)?;
    Ok(vec![p.expected_purchases(horizon)])
}

fn probability_of_n_purchases(
    _model: &BetaGeoModel,
    params: &ParamVector,
    args: &QuantityArgs<'_>,
) -> Result<Vec<f64>> {
    let horizon = args.t()?;
    let n = args.n()?;
    let p = BetaGeoParams::from_vector(params)?;
    Ok(vec![p.probability_of_n_purchases(horizon, n)])
}
