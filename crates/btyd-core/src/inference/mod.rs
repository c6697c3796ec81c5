//! Posterior inference: prior graphs, the engine contract and the
//! Metropolis sampler.

pub mod diagnostics;
pub mod engine;
pub mod metropolis;
pub mod prior;

pub use diagnostics::{split_rhat, RHAT_WARN};
pub use engine::{InferenceEngine, InferenceError, LogLikelihood, PosteriorSamples};
pub use metropolis::MetropolisEngine;
pub use prior::{Derivation, DerivedParameter, FreeParameter, Prior, PriorGraph, Unconstrain};
