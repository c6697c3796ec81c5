//! Log-densities for the prior families used by BTYD models.
//!
//! Every function returns:
//! - `NaN` when an input or a distribution parameter is NaN or invalid
//! - `NEG_INFINITY` outside the support
//! - `INFINITY` where the density diverges at a support boundary

use serde::{Deserialize, Serialize};

use super::stable::{log_beta, log_gamma};

const LOG_SQRT_2_OVER_PI: f64 = -0.225_791_352_644_727_4; // 0.5 * ln(2/pi)

/// Support of a continuous univariate distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Support {
    /// `(0, ∞)`.
    Positive,
    /// `(lower, upper)`.
    Interval { lower: f64, upper: f64 },
    /// `(min, ∞)`.
    LowerBounded { min: f64 },
}

impl Support {
    /// Whether `x` lies strictly inside the support.
    pub fn contains(&self, x: f64) -> bool {
        match *self {
            Support::Positive => x > 0.0 && x.is_finite(),
            Support::Interval { lower, upper } => x > lower && x < upper,
            Support::LowerBounded { min } => x > min && x.is_finite(),
        }
    }
}

/// Weibull log-density with shape `k` and scale `lambda`.
pub fn weibull_log_pdf(x: f64, k: f64, lambda: f64) -> f64 {
    if x.is_nan() || k.is_nan() || lambda.is_nan() {
        return f64::NAN;
    }
    if k <= 0.0 || lambda <= 0.0 {
        return f64::NAN;
    }
    if x < 0.0 {
        return f64::NEG_INFINITY;
    }
    if x == 0.0 {
        if k < 1.0 {
            return f64::INFINITY;
        }
        if k == 1.0 {
            return -lambda.ln();
        }
        return f64::NEG_INFINITY;
    }
    let scaled = x / lambda;
    k.ln() - lambda.ln() + (k - 1.0) * scaled.ln() - scaled.powf(k)
}

/// Weibull median: `lambda · ln(2)^(1/k)`.
pub fn weibull_median(k: f64, lambda: f64) -> f64 {
    lambda * std::f64::consts::LN_2.powf(1.0 / k)
}

/// Continuous uniform log-density on `[lower, upper]`.
pub fn uniform_log_pdf(x: f64, lower: f64, upper: f64) -> f64 {
    if x.is_nan() || lower.is_nan() || upper.is_nan() {
        return f64::NAN;
    }
    if lower >= upper {
        return f64::NAN;
    }
    if x < lower || x > upper {
        return f64::NEG_INFINITY;
    }
    -(upper - lower).ln()
}

/// Pareto (type I) log-density with shape `alpha` and scale (minimum) `m`.
pub fn pareto_log_pdf(x: f64, alpha: f64, m: f64) -> f64 {
    if x.is_nan() || alpha.is_nan() || m.is_nan() {
        return f64::NAN;
    }
    if alpha <= 0.0 || m <= 0.0 {
        return f64::NAN;
    }
    if x < m {
        return f64::NEG_INFINITY;
    }
    alpha.ln() + alpha * m.ln() - (alpha + 1.0) * x.ln()
}

/// Pareto median: `m · 2^(1/alpha)`.
pub fn pareto_median(alpha: f64, m: f64) -> f64 {
    m * 2.0f64.powf(1.0 / alpha)
}

/// Gamma log-density in rate parameterization: `Gamma(shape, rate)`.
pub fn gamma_log_pdf(x: f64, shape: f64, rate: f64) -> f64 {
    if x.is_nan() || shape.is_nan() || rate.is_nan() {
        return f64::NAN;
    }
    if shape <= 0.0 || rate <= 0.0 {
        return f64::NAN;
    }
    if x < 0.0 {
        return f64::NEG_INFINITY;
    }
    if x == 0.0 {
        if shape < 1.0 {
            return f64::INFINITY;
        }
        if shape == 1.0 {
            return rate.ln();
        }
        return f64::NEG_INFINITY;
    }
    shape * rate.ln() - log_gamma(shape) + (shape - 1.0) * x.ln() - rate * x
}

/// Half-normal log-density with scale `sigma`.
pub fn half_normal_log_pdf(x: f64, sigma: f64) -> f64 {
    if x.is_nan() || sigma.is_nan() {
        return f64::NAN;
    }
    if sigma <= 0.0 {
        return f64::NAN;
    }
    if x < 0.0 {
        return f64::NEG_INFINITY;
    }
    LOG_SQRT_2_OVER_PI - sigma.ln() - 0.5 * (x / sigma) * (x / sigma)
}

/// Beta log-density.
pub fn beta_log_pdf(x: f64, alpha: f64, beta: f64) -> f64 {
    if x.is_nan() || alpha.is_nan() || beta.is_nan() {
        return f64::NAN;
    }
    if alpha <= 0.0 || beta <= 0.0 {
        return f64::NAN;
    }
    if !(0.0..=1.0).contains(&x) {
        return f64::NEG_INFINITY;
    }
    if x == 0.0 {
        if alpha < 1.0 {
            return f64::INFINITY;
        }
        if alpha > 1.0 {
            return f64::NEG_INFINITY;
        }
        return -log_beta(1.0, beta);
    }
    if x == 1.0 {
        if beta < 1.0 {
            return f64::INFINITY;
        }
        if beta > 1.0 {
            return f64::NEG_INFINITY;
        }
        return -log_beta(alpha, 1.0);
    }
    (alpha - 1.0) * x.ln() + (beta - 1.0) * (-x).ln_1p() - log_beta(alpha, beta)
}
