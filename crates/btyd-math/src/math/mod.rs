//! Core math modules.

pub mod densities;
pub mod hypergeometric;
pub mod stable;
