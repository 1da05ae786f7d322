//! Cross-validated random-forest training

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::PipelineError;
use super::forest::{check_feature_schema, FeatureMatrix, ForestBackend, ForestParams};
use super::labels::LabelEncoding;
use super::partition::label_values;

/// Number of `mtry` candidates tried during cross-validation
const MTRY_GRID_LENGTH: usize = 3;

/// Training settings, passed explicitly to the trainer
#[derive(Debug, Clone, Serialize)]
pub struct TrainerConfig {
    pub label: String,
    pub trees: u16,
    pub folds: usize,
    pub seed: u64,
    /// Worker threads for cross-validation fits; `None` uses one per core
    pub workers: Option<usize>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            label: "classe".to_string(),
            trees: 100,
            folds: 2,
            seed: 12345,
            workers: None,
        }
    }
}

/// Cross-validated accuracy of one `mtry` candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationResult {
    pub mtry: usize,
    pub fold_accuracies: Vec<f64>,
    pub mean_accuracy: f64,
}

/// A fitted model plus everything needed to apply it to new tables.
///
/// Never mutated after training.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel<M> {
    pub label: String,
    pub features: Vec<String>,
    pub encoding: LabelEncoding,
    pub params: ForestParams,
    pub cross_validation: Vec<CrossValidationResult>,
    pub model: M,
}

impl<M> TrainedModel<M> {
    /// Predict one label per row of `df`.
    ///
    /// `df` must carry every training feature as a numeric column; extra
    /// columns are ignored. A missing or non-numeric feature is a fatal
    /// mismatch.
    pub fn predict_frame<B>(&self, backend: &B, df: &DataFrame) -> Result<Vec<String>>
    where
        B: ForestBackend<Model = M>,
    {
        check_feature_schema(df, &self.features)?;
        let matrix = FeatureMatrix::from_frame(df, &self.features)?;
        let indices = backend.predict(&self.model, &matrix)?;
        Ok(self.encoding.decode_all(&indices)?)
    }
}

/// `floor(seq(2, p, length = 3))` without duplicates; `[p]` when p < 2
pub fn mtry_candidates(n_features: usize) -> Vec<usize> {
    if n_features < 2 {
        return vec![n_features.max(1)];
    }

    let lo = 2.0;
    let hi = n_features as f64;
    let step = (hi - lo) / (MTRY_GRID_LENGTH - 1) as f64;

    let mut candidates: Vec<usize> = (0..MTRY_GRID_LENGTH)
        .map(|i| (lo + step * i as f64).floor() as usize)
        .collect();
    candidates.dedup();
    candidates
}

/// Assign every row to a fold, stratified by class.
///
/// Rows of each class are shuffled with the seeded RNG and dealt round-robin,
/// so fold class proportions match the full set within one row per class.
pub fn stratified_folds(labels: &[u32], folds: usize, seed: u64) -> Vec<usize> {
    let folds = folds.max(1);
    let mut by_class: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (row, &class) in labels.iter().enumerate() {
        by_class.entry(class).or_default().push(row);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut assignment = vec![0; labels.len()];
    let mut next = 0;
    for (_, mut rows) in by_class {
        rows.shuffle(&mut rng);
        for row in rows {
            assignment[row] = next % folds;
            next += 1;
        }
    }

    assignment
}

fn accuracy(predicted: &[u32], actual: &[u32]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(actual.iter())
        .filter(|(p, a)| p == a)
        .count();
    correct as f64 / actual.len() as f64
}

/// Fits forests through a [`ForestBackend`]
pub struct Trainer<'a, B: ForestBackend> {
    backend: &'a B,
    config: TrainerConfig,
}

impl<'a, B: ForestBackend> Trainer<'a, B> {
    pub fn new(backend: &'a B, config: TrainerConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Cross-validate the `mtry` grid, then refit on the whole training split.
    ///
    /// Fold fits are independent and run on a dedicated thread pool sized by
    /// `TrainerConfig::workers`; results are gathered in grid order, so the
    /// outcome does not depend on the worker count.
    pub fn train(&self, train: &DataFrame, features: &[String]) -> Result<TrainedModel<B::Model>> {
        if features.is_empty() {
            return Err(PipelineError::EmptySelection.into());
        }

        let labels = label_values(train, &self.config.label)?;
        let encoding = LabelEncoding::fit(&labels);
        let encoded = encoding.encode(&labels)?;
        let matrix = FeatureMatrix::from_frame(train, features)?;

        let cross_validation = self.cross_validate(&matrix, &encoded)?;

        let mtry = cross_validation
            .iter()
            .fold(None::<&CrossValidationResult>, |best, cv| match best {
                Some(b) if b.mean_accuracy >= cv.mean_accuracy => Some(b),
                _ => Some(cv),
            })
            .map(|cv| cv.mtry)
            .unwrap_or_else(|| ((features.len() as f64).sqrt().floor() as usize).max(1));

        let params = ForestParams {
            trees: self.config.trees,
            mtry,
            seed: self.config.seed,
        };
        let model = self.backend.fit(&matrix, &encoded, &params)?;

        Ok(TrainedModel {
            label: self.config.label.clone(),
            features: features.to_vec(),
            encoding,
            params,
            cross_validation,
            model,
        })
    }

    fn cross_validate(
        &self,
        matrix: &FeatureMatrix,
        labels: &[u32],
    ) -> Result<Vec<CrossValidationResult>> {
        let folds = self.config.folds;
        let candidates = mtry_candidates(matrix.n_features());
        if folds < 2 || labels.len() < folds {
            return Ok(Vec::new());
        }

        let assignment = stratified_folds(labels, folds, self.config.seed);
        let jobs: Vec<(usize, usize)> = candidates
            .iter()
            .flat_map(|&m| (0..folds).map(move |f| (m, f)))
            .collect();

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(workers) = self.config.workers {
            builder = builder.num_threads(workers);
        }
        let pool = builder
            .build()
            .context("Failed to build training thread pool")?;

        let scores: Vec<Result<(usize, f64), PipelineError>> = pool.install(|| {
            jobs.par_iter()
                .map(|&(mtry, fold)| {
                    let fit_rows: Vec<usize> =
                        (0..labels.len()).filter(|&r| assignment[r] != fold).collect();
                    let eval_rows: Vec<usize> =
                        (0..labels.len()).filter(|&r| assignment[r] == fold).collect();

                    let fit_labels: Vec<u32> = fit_rows.iter().map(|&r| labels[r]).collect();
                    let eval_labels: Vec<u32> = eval_rows.iter().map(|&r| labels[r]).collect();

                    let params = ForestParams {
                        trees: self.config.trees,
                        mtry,
                        seed: self.config.seed,
                    };
                    let model =
                        self.backend
                            .fit(&matrix.select_rows(&fit_rows), &fit_labels, &params)?;
                    let predicted = self
                        .backend
                        .predict(&model, &matrix.select_rows(&eval_rows))?;

                    Ok((mtry, accuracy(&predicted, &eval_labels)))
                })
                .collect()
        });

        let mut by_mtry: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
        for score in scores {
            let (mtry, acc) = score?;
            by_mtry.entry(mtry).or_default().push(acc);
        }

        Ok(by_mtry
            .into_iter()
            .map(|(mtry, fold_accuracies)| {
                let mean_accuracy =
                    fold_accuracies.iter().sum::<f64>() / fold_accuracies.len() as f64;
                CrossValidationResult {
                    mtry,
                    fold_accuracies,
                    mean_accuracy,
                }
            })
            .collect())
    }
}

/// Append a predictions column to a table, keeping row order
pub fn append_predictions(df: &DataFrame, column: &str, predictions: &[String]) -> Result<DataFrame> {
    if predictions.len() != df.height() {
        anyhow::bail!(
            "Got {} predictions for a table of {} rows",
            predictions.len(),
            df.height()
        );
    }

    let mut out = df.clone();
    out.with_column(Column::new(column.into(), predictions.to_vec()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mtry_candidates_grid() {
        assert_eq!(mtry_candidates(1), vec![1]);
        assert_eq!(mtry_candidates(2), vec![2]);
        assert_eq!(mtry_candidates(3), vec![2, 3]);
        assert_eq!(mtry_candidates(10), vec![2, 6, 10]);
        assert_eq!(mtry_candidates(52), vec![2, 27, 52]);
    }

    #[test]
    fn test_stratified_folds_balance_classes() {
        let labels: Vec<u32> = (0..20).map(|i| (i % 2) as u32).collect();
        let folds = stratified_folds(&labels, 2, 7);
        for class in 0..2u32 {
            let in_fold0 = labels
                .iter()
                .zip(folds.iter())
                .filter(|(l, f)| **l == class && **f == 0)
                .count();
            assert_eq!(in_fold0, 5);
        }
    }

    #[test]
    fn test_accuracy() {
        assert_eq!(accuracy(&[0, 1, 1, 0], &[0, 1, 0, 0]), 0.75);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }
}
