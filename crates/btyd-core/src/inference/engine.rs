//! Inference engine contract.
//!
//! An engine turns a [`PriorGraph`] plus a [`LogLikelihood`] into posterior
//! samples for every named parameter, derived ones included. How it samples
//! is its own business.

use std::collections::BTreeMap;

use btyd_config::SamplerConfig;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::prior::PriorGraph;

/// Errors raised by an inference engine.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("invalid prior graph: {0}")]
    InvalidGraph(String),

    #[error("likelihood needs parameter {0}, which the prior graph does not declare")]
    UnboundParameter(String),

    #[error("no finite log-density at the initial point of chain {chain}")]
    InitialPoint { chain: usize },

    #[error("log-density became NaN in chain {chain} at iteration {iteration}")]
    NonFiniteDensity { chain: usize, iteration: usize },

    #[error("chains did not converge: R-hat for {parameter} is {rhat:.3} (limit {limit})")]
    NotConverged {
        parameter: String,
        rhat: f64,
        limit: f64,
    },

    #[error("invalid sampler settings: {0}")]
    Settings(String),

    #[error("sampler thread panicked in chain {chain}")]
    ChainPanicked { chain: usize },
}

impl From<InferenceError> for btyd_common::Error {
    fn from(err: InferenceError) -> Self {
        btyd_common::Error::InferenceFailure(err.to_string())
    }
}

/// Log-likelihood of the observed data as a function of named parameters.
pub trait LogLikelihood: Sync {
    /// Parameter names, in the order `log_likelihood` expects its values.
    fn parameter_names(&self) -> &[&'static str];

    /// Total log-likelihood. Non-finite values reject the proposal; NaN
    /// aborts sampling.
    fn log_likelihood(&self, values: &[f64]) -> f64;
}

/// A sampling backend.
pub trait InferenceEngine: Send + Sync {
    /// Short engine name for logs and snapshots.
    fn name(&self) -> &'static str;

    fn sample(
        &self,
        graph: &PriorGraph,
        target: &dyn LogLikelihood,
        settings: &SamplerConfig,
    ) -> Result<PosteriorSamples, InferenceError>;
}

/// Posterior samples for every parameter of a graph.
///
/// Each vector is chain-major: chain 0's draws, then chain 1's, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PosteriorSamples {
    pub chains: usize,
    pub draws: usize,
    pub values: BTreeMap<String, Vec<f64>>,
}

impl PosteriorSamples {
    /// Check that the shape is positive and identical across parameters and
    /// every value is finite.
    pub fn validate(&self) -> Result<(), String> {
        if self.chains == 0 || self.draws == 0 {
            return Err(format!(
                "sample shape must be positive, got {} chains x {} draws",
                self.chains, self.draws
            ));
        }
        if self.values.is_empty() {
            return Err("no parameters".to_string());
        }
        let expected = self.chains * self.draws;
        for (name, values) in &self.values {
            if values.len() != expected {
                return Err(format!(
                    "parameter {} has {} samples, expected {}",
                    name,
                    values.len(),
                    expected
                ));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(format!("parameter {} has non-finite samples", name));
            }
        }
        Ok(())
    }

    pub fn total_draws(&self) -> usize {
        self.chains * self.draws
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.values.get(name).map(Vec::as_slice)
    }

    /// Draws of one chain.
    pub fn chain(&self, name: &str, chain: usize) -> Option<&[f64]> {
        if chain >= self.chains {
            return None;
        }
        self.get(name)
            .and_then(|v| v.get(chain * self.draws..(chain + 1) * self.draws))
    }

    pub fn mean(&self, name: &str) -> Option<f64> {
        self.get(name)
            .filter(|v| !v.is_empty())
            .map(|v| v.iter().sum::<f64>() / v.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples() -> PosteriorSamples {
        let mut values = BTreeMap::new();
        values.insert("x".to_string(), vec![1.0, 2.0, 3.0, 4.0]);
        values.insert("y".to_string(), vec![0.5, 0.5, 1.5, 1.5]);
        PosteriorSamples {
            chains: 2,
            draws: 2,
            values,
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(samples().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_ragged() {
        let mut s = samples();
        s.values.get_mut("y").unwrap().pop();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_shape() {
        let mut s = samples();
        s.draws = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_chain_slices() {
        let s = samples();
        assert_eq!(s.chain("x", 1), Some(&[3.0, 4.0][..]));
        assert_eq!(s.chain("x", 2), None);
        assert_eq!(s.mean("y"), Some(1.0));
    }

    #[test]
    fn test_error_converts_to_inference_failure() {
        let err: btyd_common::Error = InferenceError::InitialPoint { chain: 0 }.into();
        assert_eq!(err.code(), 30);
    }
}
