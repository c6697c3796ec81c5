//! The owning model handle: fit, predict, persist and simulate.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use btyd_common::{Error, Result, RfmData, RfmTable};
use btyd_config::{LoadedConfig, SamplerConfig};
use rand::Rng;
use uuid::Uuid;

use crate::inference::{InferenceEngine, MetropolisEngine};
use crate::logging::{event_names, Stage};
use crate::model::{BehaviorModel, ModelLikelihood, Quantity, QuantityArgs, SyntheticTable};
use crate::posterior::{load_snapshot, save_snapshot, PosteriorSnapshot, PosteriorStore};
use crate::prediction::{PredictRequest, Prediction};

/// A model together with its fit state.
///
/// `fit` and `load` take `&mut self` and only replace the store once they
/// have fully succeeded; everything else reads through `&self`.
pub struct BtydModel<M: BehaviorModel> {
    model: M,
    sampler: SamplerConfig,
    engine: Box<dyn InferenceEngine>,
    store: PosteriorStore,
    data: Option<RfmData>,
    fit_id: Option<Uuid>,
    customers: Option<usize>,
    config_hash: Option<String>,
}

impl<M: BehaviorModel> BtydModel<M> {
    pub fn new(model: M) -> Self {
        BtydModel {
            model,
            sampler: SamplerConfig::default(),
            engine: Box::new(MetropolisEngine::new()),
            store: PosteriorStore::empty(),
            data: None,
            fit_id: None,
            customers: None,
            config_hash: None,
        }
    }

    /// Build from a resolved configuration file.
    pub fn from_config(loaded: &LoadedConfig) -> Self {
        tracing::info!(
            event = event_names::CONFIG_LOADED,
            stage = %Stage::Fit,
            model = M::NAME,
            source = ?loaded.source,
            path = loaded.path.as_deref().unwrap_or("<defaults>"),
            "configuration loaded"
        );
        let mut handle = Self::new(M::from_hyperpriors(loaded.config.hyperpriors.clone()))
            .with_sampler(loaded.config.sampler.clone());
        handle.config_hash = loaded.hash.clone();
        handle
    }

    pub fn with_sampler(mut self, sampler: SamplerConfig) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_engine(mut self, engine: Box<dyn InferenceEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn sampler(&self) -> &SamplerConfig {
        &self.sampler
    }

    pub fn store(&self) -> &PosteriorStore {
        &self.store
    }

    /// Data from the last fit, if the posterior came from a fit.
    pub fn data(&self) -> Option<&RfmData> {
        self.data.as_ref()
    }

    pub fn fit_id(&self) -> Option<Uuid> {
        self.fit_id
    }

    /// SHA-256 of the configuration file this handle was built from.
    pub fn config_hash(&self) -> Option<&str> {
        self.config_hash.as_deref()
    }

    pub fn is_fitted(&self) -> bool {
        self.store.is_fitted()
    }

    /// Fit with `tune` adaptation and `draws` retained iterations per chain.
    pub fn fit(&mut self, table: &RfmTable, tune: usize, draws: usize) -> Result<&mut Self> {
        let settings = self.sampler.clone().with_iterations(tune, draws);
        self.fit_with(table, &settings)
    }

    /// Fit with explicit sampler settings.
    pub fn fit_with(&mut self, table: &RfmTable, settings: &SamplerConfig) -> Result<&mut Self> {
        let data = RfmData::from_table(table)?;
        tracing::info!(
            event = event_names::FIT_STARTED,
            stage = %Stage::Fit,
            model = M::NAME,
            engine = self.engine.name(),
            customers = data.len(),
            chains = settings.chains,
            tune = settings.tune,
            draws = settings.draws,
            "fit started"
        );

        match self.sample(&data, settings) {
            Ok(store) => {
                self.store = store;
                self.customers = Some(data.len());
                self.data = Some(data);
                let fit_id = Uuid::new_v4();
                self.fit_id = Some(fit_id);
                tracing::info!(
                    event = event_names::FIT_FINISHED,
                    stage = %Stage::Fit,
                    model = M::NAME,
                    fit_id = %fit_id,
                    "fit finished"
                );
                Ok(self)
            }
            Err(err) => {
                tracing::warn!(
                    event = event_names::FIT_FAILED,
                    stage = %Stage::Fit,
                    model = M::NAME,
                    error = %err,
                    "fit failed; previous posterior kept"
                );
                Err(err)
            }
        }
    }

    fn sample(&self, data: &RfmData, settings: &SamplerConfig) -> Result<PosteriorStore> {
        if data.is_empty() {
            return Err(Error::invalid_input("table", "no customers to fit"));
        }
        let graph = self.model.declare_priors()?;
        let target = ModelLikelihood::new(&self.model, data);
        let samples = self.engine.sample(&graph, &target, settings)?;
        PosteriorStore::from_samples(M::NAME, samples).map_err(|e| {
            Error::InferenceFailure(format!("engine returned unusable samples: {}", e))
        })
    }

    /// Evaluate a quantity with OS-seeded resampling.
    pub fn predict(&self, request: &PredictRequest) -> Result<Prediction> {
        self.predict_with_rng(request, &mut rand::rng())
    }

    /// Evaluate a quantity using `rng` for posterior resampling.
    pub fn predict_with_rng<R: Rng + ?Sized>(
        &self,
        request: &PredictRequest,
        rng: &mut R,
    ) -> Result<Prediction> {
        request.validate()?;
        let quantity = request.quantity;

        let parsed;
        let data = match &request.table {
            Some(table) => {
                parsed = RfmData::from_table(table)?;
                Some(&parsed)
            }
            None => self.data.as_ref(),
        };

        let draws = if request.sample_posterior {
            self.store
                .posterior_draws(M::NAME, M::PARAMETER_NAMES, request.posterior_draws, rng)?
        } else {
            self.store.point_draws(M::NAME, M::PARAMETER_NAMES)?
        };

        let args = QuantityArgs {
            quantity,
            data,
            t: request.t,
            n: request.n,
        };
        args.check()?;

        tracing::debug!(
            event = event_names::PREDICT_STARTED,
            stage = %Stage::Predict,
            model = M::NAME,
            quantity = %quantity,
            draws = draws.len(),
            customers = data.map_or(0, RfmData::len),
            "predict started"
        );

        let f = self.model.quantities_of_interest().get(quantity);
        let mut values = Vec::new();
        for params in draws.iter() {
            values.extend(f(&self.model, &params, &args)?);
        }
        let rows = draws.len();
        let cols = values.len() / rows.max(1);
        let customer_ids = match data {
            Some(d) if !quantity.is_population() => d.customer_ids().to_vec(),
            _ => Vec::new(),
        };

        tracing::debug!(
            event = event_names::PREDICT_FINISHED,
            stage = %Stage::Predict,
            quantity = %quantity,
            rows,
            cols,
            "predict finished"
        );
        Ok(Prediction {
            quantity,
            rows,
            cols,
            values,
            customer_ids,
        })
    }

    /// Point-mode prediction by quantity name.
    pub fn predict_named(&self, name: &str, t: Option<f64>, n: Option<u64>) -> Result<Prediction> {
        let quantity: Quantity = name.parse()?;
        let mut request = PredictRequest::new(quantity);
        request.t = t;
        request.n = n;
        self.predict(&request)
    }

    /// Posterior means of every stored parameter.
    pub fn point_estimates(&self) -> Result<BTreeMap<String, f64>> {
        self.store.point_estimates()
    }

    /// Write the posterior; the format follows the extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let samples = self.store.samples()?;
        let hyperpriors = self
            .model
            .hyperpriors()
            .iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let snapshot = PosteriorSnapshot::new(
            M::NAME,
            self.fit_id.unwrap_or_else(Uuid::new_v4),
            self.customers,
            hyperpriors,
            samples,
        );
        save_snapshot(&snapshot, path.as_ref())
    }

    /// Replace the posterior with a saved one.
    ///
    /// The model is rebuilt from the snapshot's hyperpriors. Fit-time data
    /// is not part of a snapshot, so per-customer predictions afterwards
    /// need a table.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let snapshot = load_snapshot(path.as_ref(), M::NAME)?;
        if let Some(missing) = M::PARAMETER_NAMES
            .iter()
            .find(|name| !snapshot.samples.contains_key(**name))
        {
            return Err(Error::SnapshotInvalid(format!(
                "snapshot has no samples for parameter {}",
                missing
            )));
        }
        let store = PosteriorStore::from_samples(M::NAME, snapshot.to_samples())
            .map_err(|e| Error::SnapshotInvalid(e.to_string()))?;

        if !snapshot.hyperpriors.is_empty() {
            self.model = M::from_hyperpriors(snapshot.hyperpriors.into_iter().collect());
        }
        self.store = store;
        self.data = None;
        self.fit_id = Some(snapshot.fit_id);
        self.customers = snapshot.customers;
        Ok(self)
    }

    /// Simulate `size` customers with OS-seeded randomness.
    pub fn generate_rfm_data(&self, size: usize) -> Result<SyntheticTable> {
        self.generate_rfm_data_with_rng(size, &mut rand::rng())
    }

    /// Simulate `size` customers at the posterior means, or at the priors'
    /// central values before a fit. Observation windows cycle through the
    /// fit-time `T` values.
    pub fn generate_rfm_data_with_rng<R: Rng + ?Sized>(
        &self,
        size: usize,
        rng: &mut R,
    ) -> Result<SyntheticTable> {
        let params = if self.store.is_fitted() {
            self.store
                .point_draws(M::NAME, M::PARAMETER_NAMES)?
                .draw(0)
                .ok_or(Error::NotFitted)?
        } else {
            tracing::info!(
                event = event_names::GENERATE_PRIOR_DEFAULTS,
                stage = %Stage::Generate,
                model = M::NAME,
                "model not fitted; simulating at prior central values"
            );
            self.model.default_parameters()?
        };

        let windows = self.data.as_ref().map_or(&[][..], RfmData::T);
        let table = self.model.generate_rfm_data(&params, windows, size, rng)?;
        tracing::info!(
            event = event_names::GENERATE_FINISHED,
            stage = %Stage::Generate,
            model = M::NAME,
            rows = table.len(),
            "synthetic data generated"
        );
        Ok(table)
    }

    /// One-line description of the fitted parameters.
    pub fn summary(&self) -> Summary<'_, M> {
        Summary { handle: self }
    }
}

/// Display adapter returned by [`BtydModel::summary`].
pub struct Summary<'a, M: BehaviorModel> {
    handle: &'a BtydModel<M>,
}

impl<M: BehaviorModel> fmt::Display for Summary<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Ok(estimates) = self.handle.point_estimates() else {
            return write!(f, "<btyd.{}: not fitted>", M::NAME);
        };

        write!(f, "<btyd.{}: Parameters {{", M::NAME)?;
        for (i, name) in M::PARAMETER_NAMES.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match estimates.get(*name) {
                Some(value) => write!(f, "{}: {:.3}", name, value)?,
                None => write!(f, "{}: ?", name)?,
            }
        }
        f.write_str("}")?;
        match self.handle.customers {
            Some(n) => write!(f, " estimated with {} customers.>", n),
            None => f.write_str(" loaded from snapshot.>"),
        }
    }
}

impl<M: BehaviorModel> fmt::Debug for BtydModel<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BtydModel")
            .field("model", &M::NAME)
            .field("engine", &self.engine.name())
            .field("fitted", &self.store.is_fitted())
            .field("fit_id", &self.fit_id)
            .finish()
    }
}

impl<M: BehaviorModel + Default> Default for BtydModel<M> {
    fn default() -> Self {
        BtydModel::new(M::default())
    }
}
