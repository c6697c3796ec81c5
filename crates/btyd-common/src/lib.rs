//! BTYD common types and errors.
//!
//! This crate provides foundational types shared across btyd-core modules:
//! - The crate-wide error type with stable codes and categories
//! - RFM tables, records and validated column arrays

pub mod error;
pub mod rfm;

pub use error::{format_error_human, Error, ErrorCategory, Result, StructuredError};
pub use rfm::{check_inputs, ColumnValues, RfmData, RfmRecord, RfmTable};
