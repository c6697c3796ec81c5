//! Shared fixtures for btyd-core integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;

use btyd_common::RfmTable;
use btyd_config::SamplerConfig;
use btyd_core::inference::{
    InferenceEngine, InferenceError, LogLikelihood, PosteriorSamples, PriorGraph,
};

/// Engine that returns fixed samples for every graph parameter.
///
/// Draw `i` of parameter `name` is `base[name] + spread * (i % 3 - 1)`, so
/// the posterior mean equals `base` whenever the draw count is a multiple
/// of three.
pub struct FixedEngine {
    pub base: BTreeMap<String, f64>,
    pub spread: f64,
}

impl FixedEngine {
    pub fn beta_geo(alpha: f64, r: f64, a: f64, b: f64) -> Self {
        let kappa = a + b;
        let phi = a / kappa;
        let base = [
            ("alpha", alpha),
            ("r", r),
            ("phi", phi),
            ("kappa", kappa),
            ("a", a),
            ("b", b),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        FixedEngine { base, spread: 0.0 }
    }

    pub fn with_spread(mut self, spread: f64) -> Self {
        self.spread = spread;
        self
    }
}

impl InferenceEngine for FixedEngine {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn sample(
        &self,
        graph: &PriorGraph,
        target: &dyn LogLikelihood,
        settings: &SamplerConfig,
    ) -> Result<PosteriorSamples, InferenceError> {
        let total = settings.chains * settings.draws;
        let mut values = BTreeMap::new();
        for name in graph.names() {
            let base = *self
                .base
                .get(name)
                .ok_or_else(|| InferenceError::UnboundParameter(name.to_string()))?;
            let column = (0..total)
                .map(|i| base + self.spread * ((i % 3) as f64 - 1.0))
                .collect();
            values.insert(name.to_string(), column);
        }
        // Touch the likelihood once so broken bindings still surface.
        let point: Vec<f64> = target
            .parameter_names()
            .iter()
            .map(|n| self.base.get(*n).copied().unwrap_or(f64::NAN))
            .collect();
        if !target.log_likelihood(&point).is_finite() {
            return Err(InferenceError::InitialPoint { chain: 0 });
        }
        Ok(PosteriorSamples {
            chains: settings.chains,
            draws: settings.draws,
            values,
        })
    }
}

/// Engine that always fails.
pub struct FailingEngine;

impl InferenceEngine for FailingEngine {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn sample(
        &self,
        _graph: &PriorGraph,
        _target: &dyn LogLikelihood,
        _settings: &SamplerConfig,
    ) -> Result<PosteriorSamples, InferenceError> {
        Err(InferenceError::Settings("refusing to sample".to_string()))
    }
}

/// The five-customer table used by the reference tests, in input-table form.
pub fn five_customer_table() -> RfmTable {
    RfmTable::new()
        .with_labels("id", (0..5).map(|i| format!("c{}", i)).collect())
        .with_numbers("frequency", vec![0.0, 1.0, 2.0, 3.0, 5.0])
        .with_numbers("recency", vec![0.0, 1.5, 3.0, 4.0, 6.0])
        .with_numbers("t", vec![5.0, 5.0, 6.0, 8.0, 10.0])
        .with_numbers("monetary_value", vec![0.0, 12.5, 30.0, 8.0, 55.0])
}

/// Sampler settings small enough for tests: 1 chain x 3 draws.
pub fn tiny_sampler() -> SamplerConfig {
    SamplerConfig::default()
        .with_chains(1)
        .with_iterations(0, 3)
        .with_seed(9)
}
