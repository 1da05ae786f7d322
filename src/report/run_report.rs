//! JSON export of a complete training run

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{
    ClassStats, ConfusionMatrix, CrossValidationResult, DatasetStats, ForestParams,
    PipelineConfig, ReductionOutcome,
};

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    /// Rep-grade version
    pub repgrade_version: String,
    /// Labeled training table
    pub input_file: String,
    /// Unlabeled table that was graded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_file: Option<String>,
    /// Predictions written for the test table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predictions_file: Option<String>,
    /// Saved model artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_file: Option<String>,
    pub config: PipelineConfig,
}

/// Holdout evaluation figures
#[derive(Serialize)]
pub struct EvaluationSummary {
    pub holdout_rows: usize,
    pub correct: usize,
    pub accuracy_pct: f64,
    pub error_rate: f64,
    pub kappa: f64,
    pub confusion_matrix: ConfusionMatrix,
    pub class_stats: Vec<ClassStats>,
}

impl EvaluationSummary {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        Self {
            holdout_rows: cm.total(),
            correct: cm.correct(),
            accuracy_pct: cm.accuracy_pct(),
            error_rate: cm.error_rate(),
            kappa: cm.kappa(),
            confusion_matrix: cm.clone(),
            class_stats: cm.class_stats(),
        }
    }
}

/// Complete run export
#[derive(Serialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub train_stats: DatasetStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_stats: Option<DatasetStats>,
    pub train_rows: usize,
    pub holdout_rows: usize,
    pub reduction: ReductionOutcome,
    pub forest: ForestParams,
    pub cross_validation: Vec<CrossValidationResult>,
    pub evaluation: EvaluationSummary,
}

/// Paths recorded in the report metadata
pub struct RunFiles<'a> {
    pub input: &'a Path,
    pub test: Option<&'a Path>,
    pub predictions: Option<&'a Path>,
    pub model: Option<&'a Path>,
}

impl RunMetadata {
    pub fn new(files: &RunFiles<'_>, config: &PipelineConfig) -> Self {
        let display = |p: &Path| p.display().to_string();
        Self {
            timestamp: Utc::now().to_rfc3339(),
            repgrade_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: display(files.input),
            test_file: files.test.map(display),
            predictions_file: files.predictions.map(display),
            model_file: files.model.map(display),
            config: config.clone(),
        }
    }
}

/// Write the run report as pretty-printed JSON
pub fn export_run_report(report: &RunReport, output_path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(report).context("Failed to serialize run report to JSON")?;

    std::fs::write(output_path, json).with_context(|| {
        format!(
            "Failed to write run report to {}",
            output_path.display()
        )
    })?;

    Ok(())
}
