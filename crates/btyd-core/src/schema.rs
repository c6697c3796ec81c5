//! JSON Schema generation for the serialized output types.
//!
//! Snapshots, predictions and prior graphs are written as JSON; the schemas
//! here let downstream consumers validate those files or generate bindings.

use schemars::schema_for;
use serde_json::Value;
use std::collections::BTreeMap;

pub use crate::inference::{PosteriorSamples, PriorGraph};
pub use crate::model::{Quantity, SyntheticTable};
pub use crate::posterior::PosteriorSnapshot;
pub use crate::prediction::Prediction;

/// Available schema types with their descriptions.
pub fn available_schemas() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "PosteriorSnapshot",
            "Saved posterior samples with fit provenance",
        ),
        ("PosteriorSamples", "Chain-major samples per parameter"),
        ("PriorGraph", "Free and derived parameters of a model"),
        ("Prediction", "Quantity values, one row per parameter draw"),
        ("Quantity", "Name of a quantity of interest"),
        ("SyntheticTable", "Simulated customers for predictive checks"),
    ]
}

/// Generate JSON Schema for a type by name.
///
/// Returns None if the type is unknown.
pub fn generate_schema(type_name: &str) -> Option<Value> {
    let schema = match type_name {
        "PosteriorSnapshot" => schema_for!(PosteriorSnapshot),
        "PosteriorSamples" => schema_for!(PosteriorSamples),
        "PriorGraph" => schema_for!(PriorGraph),
        "Prediction" => schema_for!(Prediction),
        "Quantity" => schema_for!(Quantity),
        "SyntheticTable" => schema_for!(SyntheticTable),
        _ => return None,
    };
    Some(schema.to_value())
}

/// Generate all schemas as a map from type name to schema.
pub fn generate_all_schemas() -> BTreeMap<String, Value> {
    available_schemas()
        .into_iter()
        .filter_map(|(name, _)| generate_schema(name).map(|s| (name.to_string(), s)))
        .collect()
}

/// Schema output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaFormat {
    /// Pretty-printed JSON (default)
    Json,
    /// Compact single-line JSON
    JsonCompact,
}

/// Format a schema value for output.
pub fn format_schema(schema: &Value, format: SchemaFormat) -> String {
    match format {
        SchemaFormat::Json => format!("{:#}", schema),
        SchemaFormat::JsonCompact => schema.to_string(),
    }
}
