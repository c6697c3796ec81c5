//! Posterior snapshots on disk.
//!
//! The format follows the file extension:
//! - `.json`: the full [`PosteriorSnapshot`], pretty-printed. Round-trips.
//! - `.csv`: one `chain,draw,<parameters...>` row per draw. Write-only; the
//!   provenance and hyperpriors are not kept, so loading it is refused.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use btyd_common::{Error, Result};
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::inference::PosteriorSamples;
use crate::logging::{event_names, Stage};

/// Current snapshot schema version.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Serialized posterior of one fitted model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PosteriorSnapshot {
    pub schema_version: u32,
    /// Model the samples belong to.
    pub model: String,
    /// Identifier assigned when the fit ran.
    pub fit_id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Customers in the fit data, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customers: Option<usize>,
    pub chains: usize,
    pub draws: usize,
    /// Hyperpriors the model was fitted with.
    pub hyperpriors: BTreeMap<String, f64>,
    /// Chain-major samples per parameter.
    pub samples: BTreeMap<String, Vec<f64>>,
}

impl PosteriorSnapshot {
    pub fn new(
        model: impl Into<String>,
        fit_id: Uuid,
        customers: Option<usize>,
        hyperpriors: BTreeMap<String, f64>,
        samples: &PosteriorSamples,
    ) -> Self {
        PosteriorSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            model: model.into(),
            fit_id,
            created_at: Utc::now(),
            customers,
            chains: samples.chains,
            draws: samples.draws,
            hyperpriors,
            samples: samples.values.clone(),
        }
    }

    /// Check version, model and sample shape.
    pub fn validate(&self, expected_model: &str) -> Result<()> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(Error::SnapshotInvalid(format!(
                "schema version {} is not supported (expected {})",
                self.schema_version, SNAPSHOT_SCHEMA_VERSION
            )));
        }
        if self.model != expected_model {
            return Err(Error::ModelMismatch {
                expected: expected_model.to_string(),
                found: self.model.clone(),
            });
        }
        self.to_samples().validate().map_err(Error::SnapshotInvalid)
    }

    pub fn to_samples(&self) -> PosteriorSamples {
        PosteriorSamples {
            chains: self.chains,
            draws: self.draws,
            values: self.samples.clone(),
        }
    }
}

/// On-disk snapshot format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Csv,
}

impl SnapshotFormat {
    /// Format implied by the extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(SnapshotFormat::Json),
            Some("csv") => Ok(SnapshotFormat::Csv),
            _ => Err(unsupported(path)),
        }
    }
}

/// Write a snapshot in the format implied by `path`.
pub fn save_snapshot(snapshot: &PosteriorSnapshot, path: &Path) -> Result<()> {
    let format = SnapshotFormat::from_path(path)?;
    let content = match format {
        SnapshotFormat::Json => serde_json::to_vec_pretty(snapshot)?,
        SnapshotFormat::Csv => {
            tracing::warn!(
                event = event_names::SNAPSHOT_CSV_LOSSY,
                stage = %Stage::Persist,
                path = %path.display(),
                "CSV snapshots keep samples only and cannot be loaded back"
            );
            samples_csv(snapshot)?
        }
    };
    write_atomic(path, &content)?;

    tracing::info!(
        event = event_names::SNAPSHOT_SAVED,
        stage = %Stage::Persist,
        model = %snapshot.model,
        fit_id = %snapshot.fit_id,
        path = %path.display(),
        "posterior saved"
    );
    Ok(())
}

/// Read a `.json` snapshot and check it belongs to `expected_model`.
pub fn load_snapshot(path: &Path, expected_model: &str) -> Result<PosteriorSnapshot> {
    match SnapshotFormat::from_path(path)? {
        SnapshotFormat::Json => {}
        SnapshotFormat::Csv => return Err(unsupported(path)),
    }
    let content = fs::read_to_string(path)?;
    let snapshot: PosteriorSnapshot = serde_json::from_str(&content)?;
    snapshot.validate(expected_model)?;

    tracing::info!(
        event = event_names::SNAPSHOT_LOADED,
        stage = %Stage::Persist,
        model = %snapshot.model,
        fit_id = %snapshot.fit_id,
        chains = snapshot.chains,
        draws = snapshot.draws,
        path = %path.display(),
        "posterior loaded"
    );
    Ok(snapshot)
}

fn unsupported(path: &Path) -> Error {
    Error::UnsupportedFormat {
        path: path.display().to_string(),
    }
}

fn samples_csv(snapshot: &PosteriorSnapshot) -> Result<Vec<u8>> {
    let names: Vec<&str> = snapshot.samples.keys().map(String::as_str).collect();
    let mut writer = csv::Writer::from_writer(Vec::new());
    let header = ["chain", "draw"].into_iter().chain(names.iter().copied());
    writer.write_record(header).map_err(std::io::Error::from)?;

    for chain in 0..snapshot.chains {
        for draw in 0..snapshot.draws {
            let idx = chain * snapshot.draws + draw;
            let values = names.iter().map(|name| {
                let value = snapshot.samples[*name].get(idx).copied().unwrap_or(f64::NAN);
                value.to_string()
            });
            let row = [chain.to_string(), draw.to_string()].into_iter().chain(values);
            writer.write_record(row).map_err(std::io::Error::from)?;
        }
    }
    writer.into_inner().map_err(|e| Error::Io(e.into_error()))
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let file_name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("snapshot");
    let tmp_path = path.with_file_name(format!("{}.tmp.{}", file_name, std::process::id()));
    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content)?;
        let _ = file.sync_all();
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}
