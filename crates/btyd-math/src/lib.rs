//! BTYD math utilities.

pub mod math;

pub use math::densities::*;
pub use math::hypergeometric::*;
pub use math::stable::*;
