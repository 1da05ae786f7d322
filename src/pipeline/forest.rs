//! Random-forest backend abstraction and feature matrices

use anyhow::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_classifier::{
    RandomForestClassifier, RandomForestClassifierParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;

use super::error::PipelineError;

/// Dense row-major feature matrix with its column names
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Restrict `df` to `features` (in that order) and materialize it.
    ///
    /// Every requested column must exist and be numeric, otherwise the call
    /// fails with a feature mismatch listing all offending columns. Nulls in
    /// the requested columns are rejected as well.
    pub fn from_frame(df: &DataFrame, features: &[String]) -> Result<Self> {
        check_feature_schema(df, features)?;

        let mut columns_data: Vec<Vec<Option<f64>>> = Vec::with_capacity(features.len());
        let mut with_nulls = Vec::new();
        for name in features {
            let col = df.column(name)?.cast(&DataType::Float64)?;
            if col.null_count() > 0 {
                with_nulls.push(name.clone());
            }
            columns_data.push(col.f64()?.into_iter().collect());
        }

        if !with_nulls.is_empty() {
            return Err(PipelineError::NullFeatureValues(with_nulls).into());
        }

        let rows = (0..df.height())
            .map(|r| {
                columns_data
                    .iter()
                    .map(|col| col[r].unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self {
            columns: features.to_vec(),
            rows,
        })
    }

    /// Matrix holding only the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_features(&self) -> usize {
        self.columns.len()
    }
}

/// Verify that `df` carries every feature as a numeric column
pub fn check_feature_schema(df: &DataFrame, features: &[String]) -> Result<(), PipelineError> {
    let mut missing = Vec::new();
    let mut non_numeric = Vec::new();

    for name in features {
        match df.column(name) {
            Ok(col) if col.dtype().is_primitive_numeric() => {}
            Ok(_) => non_numeric.push(name.clone()),
            Err(_) => missing.push(name.clone()),
        }
    }

    if missing.is_empty() && non_numeric.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::FeatureMismatch {
            missing,
            non_numeric,
        })
    }
}

/// Hyperparameters handed to a forest backend for one fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForestParams {
    pub trees: u16,
    /// Features sampled per split
    pub mtry: usize,
    pub seed: u64,
}

/// A random-forest implementation the trainer can drive.
///
/// Implementations must be deterministic for a fixed `ForestParams::seed`.
pub trait ForestBackend: Sync {
    type Model: Send + Sync;

    fn fit(
        &self,
        features: &FeatureMatrix,
        labels: &[u32],
        params: &ForestParams,
    ) -> Result<Self::Model, PipelineError>;

    fn predict(
        &self,
        model: &Self::Model,
        features: &FeatureMatrix,
    ) -> Result<Vec<u32>, PipelineError>;
}

/// Fitted smartcore forest over `f64` features and `u32` class indices
pub type SmartcoreModel = RandomForestClassifier<f64, u32, DenseMatrix<f64>, Vec<u32>>;

/// Backend built on smartcore's random forest classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartcoreForest;

fn dense(features: &FeatureMatrix) -> DenseMatrix<f64> {
    DenseMatrix::from_2d_vec(&features.rows)
}

impl ForestBackend for SmartcoreForest {
    type Model = SmartcoreModel;

    fn fit(
        &self,
        features: &FeatureMatrix,
        labels: &[u32],
        params: &ForestParams,
    ) -> Result<Self::Model, PipelineError> {
        if features.n_rows() == 0 || features.n_rows() != labels.len() {
            return Err(PipelineError::Backend(format!(
                "cannot fit {} feature rows against {} labels",
                features.n_rows(),
                labels.len()
            )));
        }

        let mut parameters = RandomForestClassifierParameters::default();
        parameters.n_trees = params.trees;
        parameters.m = Some(params.mtry.clamp(1, features.n_features().max(1)));
        parameters.seed = params.seed;

        let x = dense(features);
        let y = labels.to_vec();

        RandomForestClassifier::fit(&x, &y, parameters)
            .map_err(|e| PipelineError::Backend(e.to_string()))
    }

    fn predict(
        &self,
        model: &Self::Model,
        features: &FeatureMatrix,
    ) -> Result<Vec<u32>, PipelineError> {
        if features.n_rows() == 0 {
            return Ok(Vec::new());
        }

        model
            .predict(&dense(features))
            .map_err(|e| PipelineError::Backend(e.to_string()))
    }
}
