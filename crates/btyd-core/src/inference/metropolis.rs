//! Component-wise random-walk Metropolis sampler.
//!
//! Each free parameter moves in unconstrained space (log, logit or shifted
//! log depending on its prior's support) with its own Gaussian proposal
//! scale. Scales adapt during tuning by stochastic approximation toward the
//! configured acceptance rate and are frozen for the retained draws. Chains
//! run in parallel on scoped threads.

use std::collections::BTreeMap;

use btyd_config::{validate_sampler, SamplerConfig};
use btyd_math::Support;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;

use super::diagnostics::{split_rhat, RHAT_WARN};
use super::engine::{InferenceEngine, InferenceError, LogLikelihood, PosteriorSamples};
use super::prior::{PriorGraph, Unconstrain};
use crate::logging::{event_names, Stage};

const MAX_INIT_ATTEMPTS: usize = 50;
const INIT_JITTER: f64 = 0.5;
const ADAPT_DECAY: f64 = 0.6;
const LOG_STEP_BOUNDS: (f64, f64) = (-12.0, 4.0);

/// Adaptive random-walk Metropolis engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetropolisEngine;

impl MetropolisEngine {
    pub fn new() -> Self {
        MetropolisEngine
    }
}

impl InferenceEngine for MetropolisEngine {
    fn name(&self) -> &'static str {
        "metropolis"
    }

    fn sample(
        &self,
        graph: &PriorGraph,
        target: &dyn LogLikelihood,
        settings: &SamplerConfig,
    ) -> Result<PosteriorSamples, InferenceError> {
        graph.validate()?;
        validate_sampler(settings).map_err(|e| InferenceError::Settings(e.to_string()))?;
        let density = Posterior::bind(graph, target)?;

        let base_seed = settings.seed.unwrap_or_else(|| rand::rng().random());
        let outputs = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..settings.chains)
                .map(|chain| {
                    let density = &density;
                    let seed = base_seed.wrapping_add(chain as u64);
                    scope.spawn(move || run_chain(density, chain, seed, settings))
                })
                .collect();

            handles
                .into_iter()
                .enumerate()
                .map(|(chain, handle)| {
                    handle
                        .join()
                        .map_err(|_| InferenceError::ChainPanicked { chain })?
                })
                .collect::<Result<Vec<ChainOutput>, InferenceError>>()
        })?;

        let names = graph.names();
        let mut values: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (idx, name) in names.iter().enumerate() {
            let mut column = Vec::with_capacity(settings.total_draws());
            for output in &outputs {
                column.extend(output.draws.iter().map(|row| row[idx]));
            }
            values.insert((*name).to_string(), column);
        }

        let samples = PosteriorSamples {
            chains: settings.chains,
            draws: settings.draws,
            values,
        };
        check_convergence(&samples, settings.max_rhat)?;
        Ok(samples)
    }
}

struct ChainOutput {
    /// One full value vector (free then derived) per retained draw.
    draws: Vec<Vec<f64>>,
}

/// Log posterior density in unconstrained coordinates.
struct Posterior<'a> {
    graph: &'a PriorGraph,
    target: &'a dyn LogLikelihood,
    supports: Vec<Support>,
    /// Position in the graph's value layout of each likelihood argument.
    binding: Vec<usize>,
}

impl<'a> Posterior<'a> {
    fn bind(graph: &'a PriorGraph, target: &'a dyn LogLikelihood) -> Result<Self, InferenceError> {
        let binding = target
            .parameter_names()
            .iter()
            .map(|name| {
                graph
                    .index_of(name)
                    .ok_or_else(|| InferenceError::UnboundParameter((*name).to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let supports = graph
            .free_parameters()
            .iter()
            .map(|p| p.prior.support())
            .collect();
        Ok(Posterior {
            graph,
            target,
            supports,
            binding,
        })
    }

    fn constrain(&self, u: &[f64]) -> Vec<f64> {
        self.supports
            .iter()
            .zip(u)
            .map(|(s, &ui)| s.from_unconstrained(ui))
            .collect()
    }

    fn log_density(&self, u: &[f64]) -> f64 {
        let x = self.constrain(u);
        let mut lp = 0.0;
        for ((s, &xi), &ui) in self.supports.iter().zip(&x).zip(u) {
            if !s.contains(xi) {
                return f64::NEG_INFINITY;
            }
            lp += s.log_jacobian(ui);
        }
        lp += self.graph.log_prior(&x);
        if !lp.is_finite() {
            return lp;
        }

        let all = self.graph.complete(&x);
        let args: Vec<f64> = self.binding.iter().map(|&i| all[i]).collect();
        lp + self.target.log_likelihood(&args)
    }
}

fn run_chain(
    density: &Posterior<'_>,
    chain: usize,
    seed: u64,
    settings: &SamplerConfig,
) -> Result<ChainOutput, InferenceError> {
    let mut rng = StdRng::seed_from_u64(seed);
    tracing::debug!(
        event = event_names::SAMPLE_CHAIN_STARTED,
        stage = %Stage::Sample,
        chain,
        seed,
        "chain started"
    );

    let (mut u, mut lp) =
        initial_point(density, &mut rng).ok_or(InferenceError::InitialPoint { chain })?;
    let dim = u.len();
    let mut log_steps = vec![settings.initial_step.ln(); dim];
    let mut accepted = vec![0usize; dim];
    let mut draws = Vec::with_capacity(settings.draws);

    for iteration in 0..settings.tune + settings.draws {
        let tuning = iteration < settings.tune;
        for i in 0..dim {
            let previous = u[i];
            let z: f64 = rng.sample(StandardNormal);
            u[i] = previous + log_steps[i].exp() * z;

            let proposed = density.log_density(&u);
            if proposed.is_nan() {
                return Err(InferenceError::NonFiniteDensity { chain, iteration });
            }
            let log_ratio = proposed - lp;
            let accept = proposed > f64::NEG_INFINITY && rng.random::<f64>().ln() < log_ratio;
            if accept {
                lp = proposed;
            } else {
                u[i] = previous;
            }

            if tuning {
                let gain = (iteration as f64 + 1.0).powf(-ADAPT_DECAY);
                let hit = if accept { 1.0 } else { 0.0 };
                log_steps[i] = (log_steps[i] + gain * (hit - settings.target_accept))
                    .clamp(LOG_STEP_BOUNDS.0, LOG_STEP_BOUNDS.1);
            } else if accept {
                accepted[i] += 1;
            }
        }

        if !tuning {
            let x = density.constrain(&u);
            draws.push(density.graph.complete(&x));
        }
    }

    let acceptance: Vec<f64> = accepted
        .iter()
        .map(|&a| a as f64 / settings.draws as f64)
        .collect();
    tracing::debug!(
        event = event_names::SAMPLE_CHAIN_FINISHED,
        stage = %Stage::Sample,
        chain,
        acceptance = ?acceptance,
        "chain finished"
    );

    Ok(ChainOutput { draws })
}

/// Jittered start around the priors' central values, falling back to the
/// un-jittered point.
fn initial_point(density: &Posterior<'_>, rng: &mut StdRng) -> Option<(Vec<f64>, f64)> {
    let centre: Vec<f64> = density
        .supports
        .iter()
        .zip(density.graph.initial_values())
        .map(|(s, x)| s.to_unconstrained(x))
        .collect();

    for _ in 0..MAX_INIT_ATTEMPTS {
        let u: Vec<f64> = centre
            .iter()
            .map(|c| c + rng.random_range(-INIT_JITTER..INIT_JITTER))
            .collect();
        let lp = density.log_density(&u);
        if lp.is_finite() {
            return Some((u, lp));
        }
    }

    let lp = density.log_density(&centre);
    lp.is_finite().then_some((centre, lp))
}

fn check_convergence(samples: &PosteriorSamples, limit: Option<f64>) -> Result<(), InferenceError> {
    if samples.chains < 2 {
        return Ok(());
    }
    for (name, values) in &samples.values {
        let Some(rhat) = split_rhat(values, samples.chains, samples.draws) else {
            continue;
        };
        if rhat > RHAT_WARN {
            tracing::warn!(
                event = event_names::SAMPLE_RHAT_HIGH,
                stage = %Stage::Sample,
                parameter = %name,
                rhat,
                "R-hat above {}",
                RHAT_WARN
            );
        }
        if let Some(limit) = limit {
            if !(rhat <= limit) {
                return Err(InferenceError::NotConverged {
                    parameter: name.clone(),
                    rhat,
                    limit,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::prior::{Derivation, Prior};

    /// Likelihood of i.i.d. exponential observations with rate `rate`.
    struct Exponential {
        sum: f64,
        count: f64,
    }

    impl LogLikelihood for Exponential {
        fn parameter_names(&self) -> &[&'static str] {
            &["rate"]
        }

        fn log_likelihood(&self, values: &[f64]) -> f64 {
            self.count * values[0].ln() - values[0] * self.sum
        }
    }

    struct Nan;

    impl LogLikelihood for Nan {
        fn parameter_names(&self) -> &[&'static str] {
            &["rate"]
        }

        fn log_likelihood(&self, _values: &[f64]) -> f64 {
            f64::NAN
        }
    }

    fn settings() -> SamplerConfig {
        SamplerConfig::default()
            .with_iterations(400, 400)
            .with_chains(2)
            .with_seed(17)
    }

    #[test]
    fn test_conjugate_gamma_posterior_mean() {
        // Gamma(2, 1) prior + 50 observations summing to 25:
        // posterior Gamma(52, 26), mean 2.
        let graph = PriorGraph::new().free("rate", Prior::Gamma { shape: 2.0, rate: 1.0 });
        let target = Exponential {
            sum: 25.0,
            count: 50.0,
        };
        let samples = MetropolisEngine::new()
            .sample(&graph, &target, &settings())
            .unwrap();

        assert_eq!(samples.total_draws(), 800);
        let mean = samples.mean("rate").unwrap();
        assert!((mean - 2.0).abs() < 0.2, "posterior mean {}", mean);
    }

    #[test]
    fn test_derived_parameters_are_recorded() {
        let graph = PriorGraph::new()
            .free("rate", Prior::Gamma { shape: 2.0, rate: 1.0 })
            .free("share", Prior::Uniform { lower: 0.0, upper: 1.0 })
            .derived(
                "part",
                Derivation::Product {
                    x: "share".into(),
                    y: "rate".into(),
                },
            );
        let target = Exponential {
            sum: 10.0,
            count: 10.0,
        };
        let samples = MetropolisEngine::new()
            .sample(&graph, &target, &settings().with_iterations(50, 20))
            .unwrap();

        samples.validate().unwrap();
        let rate = samples.get("rate").unwrap();
        let share = samples.get("share").unwrap();
        let part = samples.get("part").unwrap();
        for i in 0..samples.total_draws() {
            assert!((part[i] - share[i] * rate[i]).abs() < 1e-12);
            assert!(share[i] > 0.0 && share[i] < 1.0);
        }
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let graph = PriorGraph::new().free("rate", Prior::Weibull { shape: 1.0, scale: 2.0 });
        let target = Exponential {
            sum: 4.0,
            count: 3.0,
        };
        let config = settings().with_iterations(30, 30);
        let first = MetropolisEngine::new().sample(&graph, &target, &config).unwrap();
        let second = MetropolisEngine::new().sample(&graph, &target, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unbound_parameter_rejected() {
        let graph = PriorGraph::new().free("lambda", Prior::HalfNormal { sigma: 1.0 });
        let target = Exponential {
            sum: 1.0,
            count: 1.0,
        };
        let err = MetropolisEngine::new()
            .sample(&graph, &target, &settings())
            .unwrap_err();
        assert!(matches!(err, InferenceError::UnboundParameter(ref n) if n == "rate"));
    }

    #[test]
    fn test_nan_density_fails_at_initial_point() {
        let graph = PriorGraph::new().free("rate", Prior::HalfNormal { sigma: 1.0 });
        let err = MetropolisEngine::new()
            .sample(&graph, &Nan, &settings())
            .unwrap_err();
        assert!(matches!(err, InferenceError::InitialPoint { chain: _ }));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let graph = PriorGraph::new().free("rate", Prior::HalfNormal { sigma: 1.0 });
        let target = Exponential {
            sum: 1.0,
            count: 1.0,
        };
        let err = MetropolisEngine::new()
            .sample(&graph, &target, &settings().with_chains(0))
            .unwrap_err();
        assert!(matches!(err, InferenceError::Settings(_)));
    }

    #[test]
    fn test_rhat_limit_rejects_separated_chains() {
        let mut values = BTreeMap::new();
        let mut column: Vec<f64> = (0..20).map(|i| (i % 4) as f64).collect();
        column.extend((0..20).map(|i| 50.0 + (i % 4) as f64));
        values.insert("rate".to_string(), column);
        let samples = PosteriorSamples {
            chains: 2,
            draws: 20,
            values,
        };

        assert!(check_convergence(&samples, None).is_ok());
        let err = check_convergence(&samples, Some(1.1)).unwrap_err();
        assert!(matches!(
            err,
            InferenceError::NotConverged { ref parameter, .. } if parameter == "rate"
        ));
    }
}
