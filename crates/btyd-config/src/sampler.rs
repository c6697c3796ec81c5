//! Sampler settings passed to the inference engine.

use serde::{Deserialize, Serialize};

/// Settings for posterior sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Adaptation iterations per chain, discarded.
    pub tune: usize,
    /// Retained draws per chain.
    pub draws: usize,
    /// Independent chains.
    pub chains: usize,
    /// Acceptance rate the step-size adaptation aims for.
    pub target_accept: f64,
    /// Base seed; chain `k` uses `seed + k`. Unseeded runs draw from OS entropy.
    pub seed: Option<u64>,
    /// Fail the fit when any split-R̂ exceeds this bound.
    pub max_rhat: Option<f64>,
    /// Initial proposal scale in unconstrained space.
    pub initial_step: f64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            tune: 1200,
            draws: 1200,
            chains: 4,
            target_accept: 0.234,
            seed: None,
            max_rhat: None,
            initial_step: 0.5,
        }
    }
}

impl SamplerConfig {
    /// Same settings with different tune/draws counts.
    pub fn with_iterations(mut self, tune: usize, draws: usize) -> Self {
        self.tune = tune;
        self.draws = draws;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_chains(mut self, chains: usize) -> Self {
        self.chains = chains;
        self
    }

    /// Total retained draws across chains.
    pub fn total_draws(&self) -> usize {
        self.draws * self.chains
    }
}
