//! BTYD core library.
//!
//! Bayesian "buy till you die" customer models:
//! - The model contract and the BG/NBD model with its quantities of interest
//! - Prior graphs, the inference engine contract and a Metropolis sampler
//! - The posterior store, snapshots and the owning model handle
//! - Structured logging and JSON Schema export
//!
//! ```no_run
//! use btyd_common::RfmTable;
//! use btyd_core::{BetaGeoModel, BtydModel, PredictRequest, Quantity};
//!
//! # fn run(table: RfmTable) -> btyd_common::Result<()> {
//! let mut model = BtydModel::new(BetaGeoModel::default());
//! model.fit(&table, 1200, 1200)?;
//! let alive = model.predict(&PredictRequest::new(Quantity::AliveProbability))?;
//! println!("{}", model.summary());
//! # Ok(())
//! # }
//! ```

pub mod handle;
pub mod inference;
pub mod logging;
pub mod model;
pub mod posterior;
pub mod prediction;
pub mod schema;

pub use handle::{BtydModel, Summary};
pub use inference::{
    InferenceEngine, InferenceError, MetropolisEngine, PosteriorSamples, PriorGraph,
};
pub use model::{
    BehaviorModel, BetaGeoModel, BetaGeoParams, ParamVector, ParameterDraws, Quantity,
    QuantityTable, SyntheticTable,
};
pub use posterior::{PosteriorSnapshot, PosteriorStore};
pub use prediction::{PredictRequest, Prediction};
