//! Error types for the grading pipeline.
//!
//! Every variant is fatal: the pipeline never retries or degrades, it stops
//! and reports which contract was broken.

use thiserror::Error;

/// Errors raised by the partitioning, reduction, training and prediction stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A CSV record does not have as many fields as the header.
    #[error("line {line} has {found} field(s), expected {expected}")]
    RaggedRow { line: u64, expected: u64, found: u64 },

    /// The label column is not present in the table.
    #[error("label column '{0}' not found in dataset")]
    MissingLabel(String),

    /// The label column contains nulls, so rows cannot be stratified or fitted.
    #[error("label column '{column}' has {count} null value(s)")]
    NullLabel { column: String, count: usize },

    /// The training fraction must leave both subsets non-trivial.
    #[error("train fraction must be strictly between 0 and 1, got {0}")]
    InvalidFraction(f64),

    /// A null value survived null-column elimination.
    #[error("null values reached the correlation stage in column(s): {}", .0.join(", "))]
    ReducerContract(Vec<String>),

    /// A feature matrix was requested over columns that still hold nulls.
    #[error("feature column(s) contain null values: {}", .0.join(", "))]
    NullFeatureValues(Vec<String>),

    /// The table handed to a fitted model does not carry the training features.
    #[error(
        "feature set mismatch: missing [{}], non-numeric [{}]",
        .missing.join(", "),
        .non_numeric.join(", ")
    )]
    FeatureMismatch {
        missing: Vec<String>,
        non_numeric: Vec<String>,
    },

    /// No numeric feature survived reduction.
    #[error("no usable feature columns remain after reduction")]
    EmptySelection,

    /// The forest library rejected a fit or predict call.
    #[error("random forest backend failed: {0}")]
    Backend(String),

    /// A predicted class index has no entry in the label encoding.
    #[error("predicted class index {0} is outside the label encoding")]
    UnknownLabel(u32),

    /// A reference label was never seen when the encoding was built.
    #[error("label '{0}' does not appear in the training labels")]
    UnseenLabel(String),

    /// The persisted model was written by an incompatible format version.
    #[error("model artifact format version {found} is not supported (expected {expected})")]
    ArtifactVersion { found: u32, expected: u32 },
}
