//! Model artifact persistence

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::trainer::TrainedModel;

/// Bumped whenever the serialized layout changes
pub const ARTIFACT_FORMAT_VERSION: u32 = 2;

#[derive(Serialize, Deserialize)]
struct Artifact<T> {
    format_version: u32,
    created_by: String,
    null_tokens: Vec<String>,
    trained: T,
}

/// A model read back from disk together with the parsing rules it was trained under
#[derive(Debug)]
pub struct SavedModel<M> {
    pub trained: TrainedModel<M>,
    /// Strings the training run read as missing; new tables must be parsed the same way
    pub null_tokens: Vec<String>,
}

/// Write a trained model as a single JSON document.
///
/// `null_tokens` are the missing-value tokens the training tables were
/// loaded with, so a later grading run can parse new tables identically.
pub fn save_model<M: Serialize>(
    path: &Path,
    model: &TrainedModel<M>,
    null_tokens: &[String],
) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create model file: {}", path.display()))?;

    let artifact = Artifact {
        format_version: ARTIFACT_FORMAT_VERSION,
        created_by: format!("repgrade {}", env!("CARGO_PKG_VERSION")),
        null_tokens: null_tokens.to_vec(),
        trained: model,
    };

    serde_json::to_writer(BufWriter::new(file), &artifact)
        .with_context(|| format!("Failed to write model file: {}", path.display()))?;

    Ok(())
}

/// Read a trained model written by [`save_model`] without refitting it
pub fn load_model<M: DeserializeOwned>(path: &Path) -> Result<TrainedModel<M>> {
    Ok(load_saved_model(path)?.trained)
}

/// Read a model artifact along with the null tokens it was trained under
pub fn load_saved_model<M: DeserializeOwned>(path: &Path) -> Result<SavedModel<M>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open model file: {}", path.display()))?;

    let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Failed to parse model file: {}", path.display()))?;

    // Check the version before the layout, so old files fail with a clear error
    let found = value
        .get("format_version")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0) as u32;
    if found != ARTIFACT_FORMAT_VERSION {
        return Err(PipelineError::ArtifactVersion {
            found,
            expected: ARTIFACT_FORMAT_VERSION,
        }
        .into());
    }

    let artifact: Artifact<TrainedModel<M>> = serde_json::from_value(value)
        .with_context(|| format!("Model file has an unexpected layout: {}", path.display()))?;

    Ok(SavedModel {
        trained: artifact.trained,
        null_tokens: artifact.null_tokens,
    })
}
