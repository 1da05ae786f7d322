//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::{LoadOptions, MetadataPolicy, PipelineConfig};

/// Rep-grade - Select sensor features and grade exercise repetitions with a random forest
#[derive(Parser, Debug)]
#[command(name = "repgrade")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Labeled training table (CSV or Parquet)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Unlabeled table to grade with the fitted model (CSV or Parquet)
    #[arg(long)]
    pub test: Option<PathBuf>,

    /// Outcome label column in the training table
    #[arg(short, long, default_value = "classe")]
    pub label: String,

    /// Predictions output path (CSV or Parquet, determined by extension).
    /// Defaults to the test table's directory with a '_predictions' suffix.
    #[arg(short, long, requires = "test")]
    pub output: Option<PathBuf>,

    /// Where to write the fitted model artifact.
    /// Defaults to the input directory with a '_model.json' suffix.
    #[arg(long)]
    pub model_out: Option<PathBuf>,

    /// Where to write the JSON run report.
    /// Defaults to the input directory with a '_report.json' suffix.
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Share of each label stratum used for training; the rest is the holdout
    #[arg(long, default_value = "0.8", value_parser = validate_train_fraction)]
    pub train_fraction: f64,

    /// Correlation threshold - drop one feature from pairs with |r| above this value
    #[arg(long, default_value = "0.7", value_parser = validate_correlation_threshold)]
    pub correlation_threshold: f64,

    /// Number of trees in the final forest
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u16).range(1..))]
    pub trees: u16,

    /// Cross-validation folds used to pick mtry
    #[arg(long, default_value = "2")]
    pub folds: usize,

    /// Seed for partitioning, fold assignment and forest fitting
    #[arg(long, default_value = "12345")]
    pub seed: u64,

    /// Worker threads for cross-validation fits (defaults to one per core)
    #[arg(short = 'j', long)]
    pub workers: Option<usize>,

    /// Number of leading columns treated as metadata (row index, subject, timestamps, windows)
    #[arg(long, default_value = "7")]
    pub skip_leading_columns: usize,

    /// Additional metadata columns to exclude (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub metadata_columns: Vec<String>,

    /// Extra tokens read as missing, on top of "", "NA" and "#DIV/0!"
    #[arg(long)]
    pub null_token: Vec<String>,

    /// Non-improving expansions tolerated by the feature-subset search
    #[arg(long, default_value = "5")]
    pub max_backtracks: usize,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan.
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Grade a table with a previously saved model, without refitting
    Predict {
        /// Model artifact written by a training run
        #[arg(short, long)]
        model: PathBuf,

        /// Table to grade (CSV or Parquet)
        input: PathBuf,

        /// Output file path (optional, defaults to input with a '_predictions' suffix)
        output: Option<PathBuf>,

        /// Number of rows to use for schema inference.
        #[arg(long, default_value = "10000")]
        infer_schema_length: usize,

        /// Extra tokens read as missing, on top of those the model was trained with
        #[arg(long)]
        null_token: Vec<String>,
    },
}

/// `<dir>/<stem><suffix>` next to `input`
pub fn derive_path(input: &Path, suffix: &str) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    parent.join(format!("{}{}", stem, suffix))
}

/// Predictions path for a graded table, keeping its extension
pub fn derive_predictions_path(input: &Path) -> PathBuf {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv");
    derive_path(input, &format!("_predictions.{}", extension))
}

impl Cli {
    /// Get the training input path
    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    /// Get the predictions path, deriving from the test table if not explicitly provided.
    pub fn output_path(&self) -> Option<PathBuf> {
        if let Some(output) = &self.output {
            return Some(output.clone());
        }
        self.test.as_deref().map(derive_predictions_path)
    }

    /// Get the model artifact path, deriving from the training input if not provided.
    pub fn model_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.model_out {
            return Some(path.clone());
        }
        self.input.as_deref().map(|input| derive_path(input, "_model.json"))
    }

    /// Get the run report path, deriving from the training input if not provided.
    pub fn report_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.report {
            return Some(path.clone());
        }
        self.input.as_deref().map(|input| derive_path(input, "_report.json"))
    }

    /// Assemble the explicit run configuration from the parsed flags
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            label: self.label.clone(),
            train_fraction: self.train_fraction,
            seed: self.seed,
            load: LoadOptions {
                infer_schema_length: self.infer_schema_length,
                ..LoadOptions::default()
            }
            .with_extra_null_tokens(&self.null_token),
            metadata: MetadataPolicy {
                skip_leading: self.skip_leading_columns,
                names: self.metadata_columns.clone(),
            },
            correlation_threshold: self.correlation_threshold,
            max_backtracks: self.max_backtracks,
            trees: self.trees,
            folds: self.folds,
            workers: self.workers,
        }
    }
}

/// Validator for train_fraction parameter
fn validate_train_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!(
            "train_fraction must be strictly between 0.0 and 1.0, got {}",
            value
        ))
    }
}

/// Validator for correlation_threshold parameter
fn validate_correlation_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "correlation_threshold must be between 0.0 and 1.0, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}
