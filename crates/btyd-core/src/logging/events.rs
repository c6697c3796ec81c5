//! Stable stage and event names for structured logging.
//!
//! Every tracing call in this crate carries `event` and `stage` fields drawn
//! from here, so JSONL consumers can filter on stable keys.

use serde::{Deserialize, Serialize};

/// Processing stages in the modelling pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Table parsing and validation.
    Parse,
    /// Prior construction and fit orchestration.
    Fit,
    /// Posterior sampling inside the inference engine.
    Sample,
    /// Quantity-of-interest evaluation.
    Predict,
    /// Snapshot save and load.
    Persist,
    /// Synthetic data generation.
    Generate,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Parse => "parse",
            Stage::Fit => "fit",
            Stage::Sample => "sample",
            Stage::Predict => "predict",
            Stage::Persist => "persist",
            Stage::Generate => "generate",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Fit lifecycle
    pub const FIT_STARTED: &str = "fit.started";
    pub const FIT_FINISHED: &str = "fit.finished";
    pub const FIT_FAILED: &str = "fit.failed";

    // Sampling
    pub const SAMPLE_CHAIN_STARTED: &str = "sample.chain_started";
    pub const SAMPLE_CHAIN_FINISHED: &str = "sample.chain_finished";
    pub const SAMPLE_RHAT_HIGH: &str = "sample.rhat_high";

    // Prediction
    pub const PREDICT_STARTED: &str = "predict.started";
    pub const PREDICT_FINISHED: &str = "predict.finished";

    // Persistence
    pub const SNAPSHOT_SAVED: &str = "snapshot.saved";
    pub const SNAPSHOT_LOADED: &str = "snapshot.loaded";
    pub const SNAPSHOT_CSV_LOSSY: &str = "snapshot.csv_lossy";

    // Synthetic data
    pub const GENERATE_FINISHED: &str = "generate.finished";
    pub const GENERATE_PRIOR_DEFAULTS: &str = "generate.prior_defaults";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
}
