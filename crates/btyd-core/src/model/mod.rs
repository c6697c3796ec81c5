//! Customer-behavior models: the shared contract, parameter containers,
//! quantities of interest and the BG/NBD implementation.

pub mod beta_geo;
pub mod contract;
pub mod generate;
pub mod params;
pub mod quantity;

pub use beta_geo::{BetaGeoModel, BetaGeoParams};
pub use contract::{BehaviorModel, ModelLikelihood};
pub use generate::{simulate_beta_geo, SyntheticTable};
pub use params::{ParamVector, ParameterDraws};
pub use quantity::{Quantity, QuantityArgs, QuantityFn, QuantityTable};
