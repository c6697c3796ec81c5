//! Posterior store: the samples of a fitted model and the point/draw views
//! quantity functions consume.

use std::collections::BTreeMap;

use btyd_common::{Error, Result};
use rand::Rng;

use crate::inference::PosteriorSamples;
use crate::model::ParameterDraws;

/// Posterior samples owned by one model handle.
///
/// Empty until a fit or load succeeds; replaced wholesale after that.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PosteriorStore {
    fitted: Option<Fitted>,
}

#[derive(Debug, Clone, PartialEq)]
struct Fitted {
    model: String,
    samples: PosteriorSamples,
}

impl PosteriorStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A store holding `samples` for `model`, after a shape check.
    pub fn from_samples(model: impl Into<String>, samples: PosteriorSamples) -> Result<Self> {
        samples
            .validate()
            .map_err(|message| Error::invalid_input("samples", message))?;
        Ok(PosteriorStore {
            fitted: Some(Fitted {
                model: model.into(),
                samples,
            }),
        })
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// Name of the model the samples belong to.
    pub fn model(&self) -> Option<&str> {
        self.fitted.as_ref().map(|f| f.model.as_str())
    }

    pub fn samples(&self) -> Result<&PosteriorSamples> {
        self.fitted
            .as_ref()
            .map(|f| &f.samples)
            .ok_or(Error::NotFitted)
    }

    /// Posterior mean of every stored parameter, derived ones included.
    pub fn point_estimates(&self) -> Result<BTreeMap<String, f64>> {
        let samples = self.samples()?;
        Ok(samples
            .values
            .keys()
            .filter_map(|name| samples.mean(name).map(|m| (name.clone(), m)))
            .collect())
    }

    /// One draw holding the posterior mean of each declared name.
    pub fn point_draws(
        &self,
        model: &'static str,
        names: &'static [&'static str],
    ) -> Result<ParameterDraws> {
        let samples = self.samples_for(model)?;
        let columns = names
            .iter()
            .map(|name| Ok(vec![mean(column(samples, model, name)?)]))
            .collect::<Result<Vec<_>>>()?;
        ParameterDraws::new(model, names, columns)
    }

    /// `n` draws per declared name, resampled uniformly with replacement
    /// from that parameter's pooled samples.
    ///
    /// Each parameter is resampled independently, so a row mixes values
    /// from different joint draws. Marginals are exact; correlations
    /// between parameters are not preserved.
    pub fn posterior_draws<R: Rng + ?Sized>(
        &self,
        model: &'static str,
        names: &'static [&'static str],
        n: usize,
        rng: &mut R,
    ) -> Result<ParameterDraws> {
        if n == 0 {
            return Err(Error::invalid_input(
                "posterior_draws",
                "must request at least one draw",
            ));
        }
        let samples = self.samples_for(model)?;
        let columns = names
            .iter()
            .map(|name| {
                let pool = column(samples, model, name)?;
                Ok((0..n).map(|_| pool[rng.random_range(0..pool.len())]).collect())
            })
            .collect::<Result<Vec<_>>>()?;
        ParameterDraws::new(model, names, columns)
    }

    fn samples_for(&self, model: &str) -> Result<&PosteriorSamples> {
        let fitted = self.fitted.as_ref().ok_or(Error::NotFitted)?;
        if fitted.model != model {
            return Err(Error::ModelMismatch {
                expected: model.to_string(),
                found: fitted.model.clone(),
            });
        }
        Ok(&fitted.samples)
    }
}

fn column<'a>(samples: &'a PosteriorSamples, model: &str, name: &str) -> Result<&'a [f64]> {
    samples
        .get(name)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::UnknownParameter {
            model: model.to_string(),
            name: name.to_string(),
        })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
