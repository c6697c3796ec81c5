//! Prior graph: free parameters with prior distributions plus derived
//! (deterministic) parameters.

use btyd_math::{
    expit, gamma_log_pdf, half_normal_log_pdf, log1p_exp, logit, pareto_log_pdf, pareto_median,
    uniform_log_pdf, weibull_log_pdf, weibull_median, Support,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::engine::InferenceError;

/// Prior distribution of a free parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Prior {
    Weibull { shape: f64, scale: f64 },
    Uniform { lower: f64, upper: f64 },
    Pareto { alpha: f64, m: f64 },
    /// Rate parameterization.
    Gamma { shape: f64, rate: f64 },
    HalfNormal { sigma: f64 },
}

impl Prior {
    pub fn log_density(&self, x: f64) -> f64 {
        match *self {
            Prior::Weibull { shape, scale } => weibull_log_pdf(x, shape, scale),
            Prior::Uniform { lower, upper } => uniform_log_pdf(x, lower, upper),
            Prior::Pareto { alpha, m } => pareto_log_pdf(x, alpha, m),
            Prior::Gamma { shape, rate } => gamma_log_pdf(x, shape, rate),
            Prior::HalfNormal { sigma } => half_normal_log_pdf(x, sigma),
        }
    }

    pub fn support(&self) -> Support {
        match *self {
            Prior::Weibull { .. } | Prior::Gamma { .. } | Prior::HalfNormal { .. } => {
                Support::Positive
            }
            Prior::Uniform { lower, upper } => Support::Interval { lower, upper },
            Prior::Pareto { m, .. } => Support::LowerBounded { min: m },
        }
    }

    /// A central value strictly inside the support (the median where it has
    /// a closed form).
    pub fn initial_value(&self) -> f64 {
        match *self {
            Prior::Weibull { shape, scale } => weibull_median(shape, scale),
            Prior::Uniform { lower, upper } => 0.5 * (lower + upper),
            Prior::Pareto { alpha, m } => pareto_median(alpha, m),
            Prior::Gamma { shape, rate } => shape / rate,
            Prior::HalfNormal { sigma } => 0.674_489_750_196_081_7 * sigma,
        }
    }

    /// Check the distribution parameters.
    pub fn validate(&self, name: &str) -> Result<(), InferenceError> {
        let ok = match *self {
            Prior::Weibull { shape, scale } => shape > 0.0 && scale > 0.0,
            Prior::Uniform { lower, upper } => {
                lower.is_finite() && upper.is_finite() && lower < upper
            }
            Prior::Pareto { alpha, m } => alpha > 0.0 && m > 0.0,
            Prior::Gamma { shape, rate } => shape > 0.0 && rate > 0.0,
            Prior::HalfNormal { sigma } => sigma > 0.0,
        };
        if ok && self.initial_value().is_finite() {
            Ok(())
        } else {
            Err(InferenceError::InvalidGraph(format!(
                "prior for {} has invalid parameters: {:?}",
                name, self
            )))
        }
    }
}

/// Map from the support to the real line and back.
///
/// Samplers move in unconstrained space `u` and add `log_jacobian(u)` to the
/// target density.
pub trait Unconstrain {
    fn to_unconstrained(&self, x: f64) -> f64;
    fn from_unconstrained(&self, u: f64) -> f64;
    /// `log |dx/du|`.
    fn log_jacobian(&self, u: f64) -> f64;
}

impl Unconstrain for Support {
    fn to_unconstrained(&self, x: f64) -> f64 {
        match *self {
            Support::Positive => x.ln(),
            Support::Interval { lower, upper } => logit((x - lower) / (upper - lower)),
            Support::LowerBounded { min } => (x - min).ln(),
        }
    }

    fn from_unconstrained(&self, u: f64) -> f64 {
        match *self {
            Support::Positive => u.exp(),
            Support::Interval { lower, upper } => lower + (upper - lower) * expit(u),
            Support::LowerBounded { min } => min + u.exp(),
        }
    }

    fn log_jacobian(&self, u: f64) -> f64 {
        match *self {
            Support::Positive | Support::LowerBounded { .. } => u,
            Support::Interval { lower, upper } => {
                (upper - lower).ln() - log1p_exp(-u) - log1p_exp(u)
            }
        }
    }
}

/// Deterministic function of other parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Derivation {
    /// `x · y`
    Product { x: String, y: String },
    /// `(1 - x) · y`
    ComplementProduct { x: String, y: String },
}

impl Derivation {
    fn inputs(&self) -> (&str, &str) {
        match self {
            Derivation::Product { x, y } | Derivation::ComplementProduct { x, y } => {
                (x.as_str(), y.as_str())
            }
        }
    }

    fn apply(&self, x: f64, y: f64) -> f64 {
        match self {
            Derivation::Product { .. } => x * y,
            Derivation::ComplementProduct { .. } => (1.0 - x) * y,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FreeParameter {
    pub name: String,
    pub prior: Prior,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DerivedParameter {
    pub name: String,
    pub derivation: Derivation,
}

/// Named-parameter prior specification.
///
/// Values are laid out free parameters first (declaration order), then
/// derived parameters (declaration order). A derived parameter may only
/// reference parameters declared before it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PriorGraph {
    free: Vec<FreeParameter>,
    derived: Vec<DerivedParameter>,
}

impl PriorGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn free(mut self, name: impl Into<String>, prior: Prior) -> Self {
        self.free.push(FreeParameter {
            name: name.into(),
            prior,
        });
        self
    }

    pub fn derived(mut self, name: impl Into<String>, derivation: Derivation) -> Self {
        self.derived.push(DerivedParameter {
            name: name.into(),
            derivation,
        });
        self
    }

    pub fn free_parameters(&self) -> &[FreeParameter] {
        &self.free
    }

    pub fn derived_parameters(&self) -> &[DerivedParameter] {
        &self.derived
    }

    /// All names in value layout order.
    pub fn names(&self) -> Vec<&str> {
        self.free
            .iter()
            .map(|p| p.name.as_str())
            .chain(self.derived.iter().map(|p| p.name.as_str()))
            .collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names().iter().position(|n| *n == name)
    }

    /// Check priors, name uniqueness and derivation references.
    pub fn validate(&self) -> Result<(), InferenceError> {
        if self.free.is_empty() {
            return Err(InferenceError::InvalidGraph(
                "graph declares no free parameters".to_string(),
            ));
        }
        for p in &self.free {
            p.prior.validate(&p.name)?;
        }

        let names = self.names();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(InferenceError::InvalidGraph(format!(
                    "parameter {} declared twice",
                    name
                )));
            }
        }

        for (k, d) in self.derived.iter().enumerate() {
            let visible = &names[..self.free.len() + k];
            let (x, y) = d.derivation.inputs();
            for input in [x, y] {
                if !visible.contains(&input) {
                    return Err(InferenceError::InvalidGraph(format!(
                        "derived parameter {} references undeclared {}",
                        d.name, input
                    )));
                }
            }
        }
        Ok(())
    }

    /// Sum of prior log-densities of the free parameters.
    pub fn log_prior(&self, free_values: &[f64]) -> f64 {
        self.free
            .iter()
            .zip(free_values)
            .map(|(p, &x)| p.prior.log_density(x))
            .sum()
    }

    /// Full value vector (free then derived) from free values.
    pub fn complete(&self, free_values: &[f64]) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.free.len() + self.derived.len());
        values.extend_from_slice(free_values);
        let names = self.names();
        for d in &self.derived {
            let (x, y) = d.derivation.inputs();
            let lookup = |name: &str| {
                names
                    .iter()
                    .position(|n| *n == name)
                    .and_then(|i| values.get(i).copied())
                    .unwrap_or(f64::NAN)
            };
            let value = d.derivation.apply(lookup(x), lookup(y));
            values.push(value);
        }
        values
    }

    /// Free values at each prior's central value.
    pub fn initial_values(&self) -> Vec<f64> {
        self.free.iter().map(|p| p.prior.initial_value()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bg_graph() -> PriorGraph {
        PriorGraph::new()
            .free("alpha", Prior::Weibull { shape: 1.0, scale: 6.0 })
            .free("r", Prior::Weibull { shape: 1.0, scale: 1.0 })
            .free("phi", Prior::Uniform { lower: 0.0, upper: 1.0 })
            .free("kappa", Prior::Pareto { alpha: 1.0, m: 1.5 })
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
            )
    }

    #[test]
    fn test_graph_validates_and_lays_out_names() {
        let g = bg_graph();
        g.validate().unwrap();
        assert_eq!(g.names(), vec!["alpha", "r", "phi", "kappa", "a", "b"]);
        assert_eq!(g.index_of("b"), Some(5));
    }

    #[test]
    fn test_complete_applies_derivations() {
        let g = bg_graph();
        let values = g.complete(&[1.0, 0.5, 0.25, 4.0]);
        assert_eq!(values[4], 1.0);
        assert_eq!(values[5], 3.0);
    }

    #[test]
    fn test_undeclared_reference_rejected() {
        let g = PriorGraph::new()
            .free("x", Prior::HalfNormal { sigma: 1.0 })
            .derived(
                "y",
                Derivation::Product {
                    x: "x".into(),
                    y: "missing".into(),
                },
            );
        assert!(matches!(g.validate(), Err(InferenceError::InvalidGraph(_))));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let g = PriorGraph::new()
            .free("x", Prior::HalfNormal { sigma: 1.0 })
            .free("x", Prior::HalfNormal { sigma: 2.0 });
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_invalid_prior_parameters_rejected() {
        let g = PriorGraph::new().free("x", Prior::Weibull { shape: 0.0, scale: 1.0 });
        assert!(g.validate().is_err());
    }

    #[test]
    fn test_initial_values_inside_support() {
        let g = bg_graph();
        for (p, x) in g.free_parameters().iter().zip(g.initial_values()) {
            assert!(p.prior.support().contains(x), "{} start {} outside support", p.name, x);
            assert!(p.prior.log_density(x).is_finite());
        }
    }

    #[test]
    fn test_transforms_round_trip() {
        let supports = [
            Support::Positive,
            Support::Interval {
                lower: 0.0,
                upper: 1.0,
            },
            Support::LowerBounded { min: 1.5 },
        ];
        for s in supports {
            for u in [-3.0, -0.5, 0.0, 0.7, 4.0] {
                let x = s.from_unconstrained(u);
                assert!(s.contains(x));
                assert!((s.to_unconstrained(x) - u).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_interval_jacobian_matches_finite_difference() {
        let s = Support::Interval {
            lower: 0.0,
            upper: 2.0,
        };
        let u = 0.3;
        let h = 1e-6;
        let numeric = (s.from_unconstrained(u + h) - s.from_unconstrained(u - h)) / (2.0 * h);
        assert!((s.log_jacobian(u) - numeric.ln()).abs() < 1e-6);
    }
}
