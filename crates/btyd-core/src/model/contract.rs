//! The contract every customer-behavior model implements.

use btyd_common::{Error, Result, RfmData};
use btyd_config::HyperpriorConfig;
use rand::Rng;

use super::generate::SyntheticTable;
use super::params::{ParamVector, ParameterDraws};
use super::quantity::QuantityTable;
use crate::inference::{LogLikelihood, PriorGraph};

/// A Bayesian customer-behavior model.
///
/// `PARAMETER_NAMES` is the exact set of names the likelihood and every
/// quantity function read. The prior graph must declare each of them,
/// either as a free or a derived parameter.
pub trait BehaviorModel: Send + Sync + Sized + 'static {
    /// Model name used in logs, summaries and snapshots.
    const NAME: &'static str;

    const PARAMETER_NAMES: &'static [&'static str];

    fn from_hyperpriors(hyperpriors: HyperpriorConfig) -> Self;

    fn hyperpriors(&self) -> &HyperpriorConfig;

    /// Prior specification, including derived parameters.
    fn declare_priors(&self) -> Result<PriorGraph>;

    /// Total log-likelihood of `data` at `params`.
    fn log_likelihood(&self, data: &RfmData, params: &ParamVector) -> Result<f64>;

    /// Log-likelihood at each draw of a batch.
    fn log_likelihood_batch(&self, data: &RfmData, draws: &ParameterDraws) -> Result<Vec<f64>> {
        draws
            .iter()
            .map(|params| self.log_likelihood(data, &params))
            .collect()
    }

    fn quantities_of_interest(&self) -> QuantityTable<Self>;

    /// Simulate `size` customers observed over windows cycling through `t`.
    fn generate_rfm_data<R: Rng + ?Sized>(
        &self,
        params: &ParamVector,
        t: &[f64],
        size: usize,
        rng: &mut R,
    ) -> Result<SyntheticTable>;

    /// Parameters at the priors' central values.
    fn default_parameters(&self) -> Result<ParamVector> {
        let graph = self.declare_priors()?;
        let values = graph.complete(&graph.initial_values());
        let declared = Self::PARAMETER_NAMES
            .iter()
            .map(|name| {
                graph
                    .index_of(name)
                    .map(|i| values[i])
                    .ok_or_else(|| Error::UnknownParameter {
                        model: Self::NAME.to_string(),
                        name: (*name).to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        ParamVector::new(Self::NAME, Self::PARAMETER_NAMES, declared)
    }
}

/// Adapts a model's likelihood over fixed data to the engine's
/// [`LogLikelihood`] interface.
pub struct ModelLikelihood<'a, M> {
    model: &'a M,
    data: &'a RfmData,
}

impl<'a, M: BehaviorModel> ModelLikelihood<'a, M> {
    pub fn new(model: &'a M, data: &'a RfmData) -> Self {
        ModelLikelihood { model, data }
    }
}

impl<M: BehaviorModel> LogLikelihood for ModelLikelihood<'_, M> {
    fn parameter_names(&self) -> &[&'static str] {
        M::PARAMETER_NAMES
    }

    // Parameter vectors the model rejects have zero likelihood.
    fn log_likelihood(&self, values: &[f64]) -> f64 {
        ParamVector::new(M::NAME, M::PARAMETER_NAMES, values.to_vec())
            .and_then(|params| self.model.log_likelihood(self.data, &params))
            .unwrap_or(f64::NEG_INFINITY)
    }
}
