//! Error types for BTYD modelling.
//!
//! This module provides structured error handling with:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for callers that retry with different inputs
//! - Remediation suggestions for humans
//!
//! # Human-Facing Output
//!
//! ```text
//! ✗ Invalid Input
//!   Reason: invalid input for recency: row 3 has recency 12.5 greater than T 10
//!   Fix: Check the RFM summary: recency must not exceed T for any customer.
//! ```
//!
//! # Machine-Facing Output
//!
//! ```json
//! {
//!   "code": 12,
//!   "category": "input",
//!   "message": "invalid input for recency: row 3 has recency 12.5 greater than T 10",
//!   "recoverable": true,
//!   "context": { "field": "recency" }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for BTYD operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed or out-of-domain RFM input.
    Input,
    /// Model usage errors (unfitted model, unknown names).
    Model,
    /// Failures surfaced by the inference engine.
    Inference,
    /// Snapshot save/load and serialization errors.
    Persistence,
    /// Hyperprior and sampler configuration errors.
    Config,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Input => write!(f, "input"),
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Inference => write!(f, "inference"),
            ErrorCategory::Persistence => write!(f, "persistence"),
            ErrorCategory::Config => write!(f, "config"),
        }
    }
}

/// Unified error type for BTYD modelling.
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (10-19)
    #[error("missing required column: {column}")]
    MissingColumn { column: String },

    #[error("column {column} has {actual} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid input for {field}: {message}")]
    InputValidation { field: String, message: String },

    // Model usage errors (20-29)
    #[error("model has not been fitted; call fit or load first")]
    NotFitted,

    #[error("unknown quantity of interest: {name}")]
    UnknownQuantity { name: String },

    #[error("model {model} has no parameter named {name}")]
    UnknownParameter { model: String, name: String },

    #[error("posterior belongs to model {found}, expected {expected}")]
    ModelMismatch { expected: String, found: String },

    #[error("quantity {quantity} requires argument {argument}")]
    MissingArgument {
        quantity: String,
        argument: &'static str,
    },

    // Inference errors (30-39)
    #[error("inference failed: {0}")]
    InferenceFailure(String),

    // Persistence errors (40-49)
    #[error("unsupported snapshot format: {path}")]
    UnsupportedFormat { path: String },

    #[error("invalid posterior snapshot: {0}")]
    SnapshotInvalid(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Configuration errors (50-59)
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Convenience constructor for [`Error::InputValidation`].
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InputValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Input errors
    /// - 20-29: Model usage errors
    /// - 30-39: Inference errors
    /// - 40-49: Persistence errors
    /// - 50-59: Configuration errors
    pub fn code(&self) -> u32 {
        match self {
            Error::MissingColumn { .. } => 10,
            Error::ColumnLengthMismatch { .. } => 11,
            Error::InputValidation { .. } => 12,
            Error::NotFitted => 20,
            Error::UnknownQuantity { .. } => 21,
            Error::UnknownParameter { .. } => 22,
            Error::ModelMismatch { .. } => 23,
            Error::MissingArgument { .. } => 24,
            Error::InferenceFailure(_) => 30,
            Error::UnsupportedFormat { .. } => 40,
            Error::SnapshotInvalid(_) => 41,
            Error::Io(_) => 42,
            Error::Json(_) => 43,
            Error::Config(_) => 50,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::MissingColumn { .. }
            | Error::ColumnLengthMismatch { .. }
            | Error::InputValidation { .. } => ErrorCategory::Input,

            Error::NotFitted
            | Error::UnknownQuantity { .. }
            | Error::UnknownParameter { .. }
            | Error::ModelMismatch { .. }
            | Error::MissingArgument { .. } => ErrorCategory::Model,

            Error::InferenceFailure(_) => ErrorCategory::Inference,

            Error::UnsupportedFormat { .. }
            | Error::SnapshotInvalid(_)
            | Error::Io(_)
            | Error::Json(_) => ErrorCategory::Persistence,

            Error::Config(_) => ErrorCategory::Config,
        }
    }

    /// Returns whether the caller can plausibly succeed by retrying with
    /// different inputs or after fitting.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Error::MissingColumn { .. } => true,
            Error::ColumnLengthMismatch { .. } => true,
            Error::InputValidation { .. } => true,

            Error::NotFitted => true,
            Error::UnknownQuantity { .. } => false,
            // Cross-model lookups are programming errors.
            Error::UnknownParameter { .. } => false,
            Error::ModelMismatch { .. } => false,
            Error::MissingArgument { .. } => true,

            Error::InferenceFailure(_) => true,

            Error::UnsupportedFormat { .. } => false,
            Error::SnapshotInvalid(_) => false,
            Error::Io(_) => true,
            Error::Json(_) => false,

            Error::Config(_) => true,
        }
    }

    /// Returns a human-readable remediation hint.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::MissingColumn { .. } => {
                "Provide FREQUENCY, RECENCY, T and MONETARY_VALUE columns (case-insensitive); ID is optional."
            }
            Error::ColumnLengthMismatch { .. } => "Every column of the RFM table must have the same number of rows.",
            Error::InputValidation { .. } => {
                "Check the RFM summary: frequency must be a non-negative integer, T positive, and recency must not exceed T."
            }
            Error::NotFitted => "Fit the model on RFM data or load a saved posterior before predicting.",
            Error::UnknownQuantity { .. } => {
                "Use one of: alive_probability, conditional_expected_purchases, expected_purchases, probability_of_n_purchases."
            }
            Error::UnknownParameter { .. } => "Parameter lookups must use the names declared by the model's priors.",
            Error::ModelMismatch { .. } => "Load the snapshot into a model of the class that produced it.",
            Error::MissingArgument { .. } => "Pass the time horizon t (and n for probability_of_n_purchases).",
            Error::InferenceFailure(_) => {
                "Increase tune/draws, revisit the hyperpriors, or check the data for extreme values."
            }
            Error::UnsupportedFormat { .. } => "Use a .json path; .csv is write-only and lossy.",
            Error::SnapshotInvalid(_) => "The snapshot is damaged or was written by an incompatible version; refit the model.",
            Error::Io(_) => "Check that the path exists and is writable, then retry.",
            Error::Json(_) => "The file is not valid JSON. Check syntax or restore from backup.",
            Error::Config(_) => "Validate the configuration file against the documented hyperprior names.",
        }
    }

    /// Returns a short headline for human-readable output.
    pub fn headline(&self) -> &'static str {
        match self {
            Error::MissingColumn { .. } => "Missing Column",
            Error::ColumnLengthMismatch { .. } => "Ragged Table",
            Error::InputValidation { .. } => "Invalid Input",
            Error::NotFitted => "Model Not Fitted",
            Error::UnknownQuantity { .. } => "Unknown Quantity",
            Error::UnknownParameter { .. } => "Unknown Parameter",
            Error::ModelMismatch { .. } => "Model Mismatch",
            Error::MissingArgument { .. } => "Missing Argument",
            Error::InferenceFailure(_) => "Inference Failure",
            Error::UnsupportedFormat { .. } => "Unsupported Format",
            Error::SnapshotInvalid(_) => "Invalid Snapshot",
            Error::Io(_) => "I/O Error",
            Error::Json(_) => "JSON Parse Error",
            Error::Config(_) => "Configuration Error",
        }
    }
}

/// Structured error response for JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Stable error code.
    pub code: u32,

    /// Error category for grouping.
    pub category: ErrorCategory,

    /// Human-readable error message.
    pub message: String,

    /// Whether the error is potentially recoverable.
    pub recoverable: bool,

    /// Additional structured context (e.g., column, quantity).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub context: HashMap<String, serde_json::Value>,
}

impl From<&Error> for StructuredError {
    fn from(err: &Error) -> Self {
        let mut context = HashMap::new();

        match err {
            Error::MissingColumn { column } => {
                context.insert("column".to_string(), serde_json::json!(column));
            }
            Error::ColumnLengthMismatch {
                column,
                expected,
                actual,
            } => {
                context.insert("column".to_string(), serde_json::json!(column));
                context.insert("expected_rows".to_string(), serde_json::json!(expected));
                context.insert("actual_rows".to_string(), serde_json::json!(actual));
            }
            Error::InputValidation { field, .. } => {
                context.insert("field".to_string(), serde_json::json!(field));
            }
            Error::UnknownQuantity { name } => {
                context.insert("quantity".to_string(), serde_json::json!(name));
            }
            Error::UnknownParameter { model, name } => {
                context.insert("model".to_string(), serde_json::json!(model));
                context.insert("parameter".to_string(), serde_json::json!(name));
            }
            Error::ModelMismatch { expected, found } => {
                context.insert("expected_model".to_string(), serde_json::json!(expected));
                context.insert("found_model".to_string(), serde_json::json!(found));
            }
            Error::UnsupportedFormat { path } => {
                context.insert("path".to_string(), serde_json::json!(path));
            }
            _ => {}
        }

        StructuredError {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            context,
        }
    }
}

impl StructuredError {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"code":{},"error":"serialization_failed"}}"#, self.code)
        })
    }
}

/// Format an error for human-readable stderr output.
///
/// Output format:
/// ```text
/// ✗ [Headline]
///   Reason: [Error message]
///   Fix: [Remediation hint]
/// ```
pub fn format_error_human(err: &Error, use_color: bool) -> String {
    let (red, cyan, reset) = if use_color {
        ("\x1b[31m", "\x1b[36m", "\x1b[0m")
    } else {
        ("", "", "")
    };

    format!(
        "{red}✗{reset} {headline}\n  Reason: {message}\n  {cyan}Fix:{reset} {remediation}",
        red = red,
        cyan = cyan,
        reset = reset,
        headline = err.headline(),
        message = err,
        remediation = err.remediation()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            Error::MissingColumn {
                column: "T".into()
            }
            .code(),
            10
        );
        assert_eq!(Error::NotFitted.code(), 20);
        assert_eq!(
            Error::UnknownQuantity {
                name: "bogus".into()
            }
            .code(),
            21
        );
        assert_eq!(Error::InferenceFailure("diverged".into()).code(), 30);
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            Error::invalid_input("recency", "too large").category(),
            ErrorCategory::Input
        );
        assert_eq!(Error::NotFitted.category(), ErrorCategory::Model);
        assert_eq!(
            Error::InferenceFailure("x".into()).category(),
            ErrorCategory::Inference
        );
        assert_eq!(
            Error::SnapshotInvalid("x".into()).category(),
            ErrorCategory::Persistence
        );
        assert_eq!(Error::Config("x".into()).category(), ErrorCategory::Config);
    }

    #[test]
    fn test_recoverability() {
        assert!(Error::NotFitted.is_recoverable());
        assert!(!Error::UnknownQuantity {
            name: "bogus".into()
        }
        .is_recoverable());
        assert!(!Error::ModelMismatch {
            expected: "BetaGeoModel".into(),
            found: "ParetoModel".into()
        }
        .is_recoverable());
    }

    #[test]
    fn test_structured_error_context() {
        let err = Error::MissingColumn {
            column: "RECENCY".into(),
        };
        let structured = StructuredError::from(&err);
        assert_eq!(structured.code, 10);
        assert_eq!(structured.category, ErrorCategory::Input);
        assert_eq!(structured.context["column"], serde_json::json!("RECENCY"));

        let json = structured.to_json();
        assert!(json.contains("\"category\":\"input\""));
    }

    #[test]
    fn test_format_error_human() {
        let err = Error::UnknownQuantity {
            name: "bogus_name".into(),
        };
        let out = format_error_human(&err, false);
        assert!(out.contains("Unknown Quantity"));
        assert!(out.contains("bogus_name"));
        assert!(out.contains("Fix:"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert_eq!(err.code(), 42);
        assert_eq!(err.category(), ErrorCategory::Persistence);
    }
}
