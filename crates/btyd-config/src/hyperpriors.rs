//! Hyperprior configuration: named hyperparameter values for model priors.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::validate::{ValidationError, ValidationResult};

/// Shape of the Weibull prior on `alpha`.
pub const ALPHA_PRIOR_ALPHA: &str = "alpha_prior_alpha";
/// Scale of the Weibull prior on `alpha`.
pub const ALPHA_PRIOR_BETA: &str = "alpha_prior_beta";
/// Shape of the Weibull prior on `r`.
pub const R_PRIOR_ALPHA: &str = "r_prior_alpha";
/// Scale of the Weibull prior on `r`.
pub const R_PRIOR_BETA: &str = "r_prior_beta";
/// Lower bound of the uniform prior on `phi`.
pub const PHI_PRIOR_LOWER: &str = "phi_prior_lower";
/// Upper bound of the uniform prior on `phi`.
pub const PHI_PRIOR_UPPER: &str = "phi_prior_upper";
/// Shape of the Pareto prior on `kappa`.
pub const KAPPA_PRIOR_ALPHA: &str = "kappa_prior_alpha";
/// Minimum of the Pareto prior on `kappa`.
pub const KAPPA_PRIOR_M: &str = "kappa_prior_m";

/// Mapping from hyperparameter name to value.
///
/// Serialized as a flat JSON object. Missing names are never defaulted at
/// lookup time; use [`HyperpriorConfig::require`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HyperpriorConfig(BTreeMap<String, f64>);

impl HyperpriorConfig {
    /// An empty configuration.
    pub fn empty() -> Self {
        HyperpriorConfig(BTreeMap::new())
    }

    /// Defaults for the BG/NBD model.
    pub fn beta_geo_default() -> Self {
        HyperpriorConfig::empty()
            .with(ALPHA_PRIOR_ALPHA, 1.0)
            .with(ALPHA_PRIOR_BETA, 6.0)
            .with(R_PRIOR_ALPHA, 1.0)
            .with(R_PRIOR_BETA, 1.0)
            .with(PHI_PRIOR_LOWER, 0.0)
            .with(PHI_PRIOR_UPPER, 1.0)
            .with(KAPPA_PRIOR_ALPHA, 1.0)
            .with(KAPPA_PRIOR_M, 1.5)
    }

    /// Set a value, replacing any previous one.
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Look up a value that must be present.
    pub fn require(&self, name: &str) -> ValidationResult<f64> {
        self.get(name)
            .ok_or_else(|| ValidationError::MissingField(name.to_string()))
    }

    /// Entries of `self` layered over `defaults`.
    pub fn merged_over(&self, defaults: &HyperpriorConfig) -> HyperpriorConfig {
        let mut merged = defaults.0.clone();
        merged.extend(self.0.iter().map(|(k, v)| (k.clone(), *v)));
        HyperpriorConfig(merged)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for HyperpriorConfig {
    fn default() -> Self {
        HyperpriorConfig::beta_geo_default()
    }
}

impl FromIterator<(String, f64)> for HyperpriorConfig {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        HyperpriorConfig(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let h = HyperpriorConfig::beta_geo_default();
        assert_eq!(h.len(), 8);
        assert_eq!(h.get(ALPHA_PRIOR_BETA), Some(6.0));
        assert_eq!(h.get(KAPPA_PRIOR_M), Some(1.5));
    }

    #[test]
    fn test_require_missing_fails() {
        let h = HyperpriorConfig::empty();
        let err = h.require(R_PRIOR_ALPHA).unwrap_err();
        assert!(matches!(err, ValidationError::MissingField(ref name) if name == R_PRIOR_ALPHA));
    }

    #[test]
    fn test_merged_over_defaults() {
        let user = HyperpriorConfig::empty().with(ALPHA_PRIOR_BETA, 2.0);
        let merged = user.merged_over(&HyperpriorConfig::beta_geo_default());
        assert_eq!(merged.get(ALPHA_PRIOR_BETA), Some(2.0));
        assert_eq!(merged.get(R_PRIOR_BETA), Some(1.0));
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let h = HyperpriorConfig::empty().with("x", 1.5);
        assert_eq!(serde_json::to_string(&h).unwrap(), r#"{"x":1.5}"#);
        let back: HyperpriorConfig = serde_json::from_str(r#"{"x":1.5}"#).unwrap();
        assert_eq!(back, h);
    }
}
