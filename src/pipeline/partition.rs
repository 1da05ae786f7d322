//! Stratified train/holdout partitioning

use std::collections::BTreeMap;

use anyhow::Result;
use polars::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::error::PipelineError;

/// Result of a stratified split.
///
/// Row indices refer to positions in the input table and are sorted
/// ascending, so each frame keeps the input row order.
#[derive(Debug, Clone)]
pub struct Partition {
    pub train: DataFrame,
    pub holdout: DataFrame,
    pub train_rows: Vec<IdxSize>,
    pub holdout_rows: Vec<IdxSize>,
}

/// Read a label column as owned strings, failing on nulls
pub fn label_values(df: &DataFrame, label: &str) -> Result<Vec<String>> {
    let column = df
        .column(label)
        .map_err(|_| PipelineError::MissingLabel(label.to_string()))?;

    let null_count = column.null_count();
    if null_count > 0 {
        return Err(PipelineError::NullLabel {
            column: label.to_string(),
            count: null_count,
        }
        .into());
    }

    let as_str = column.cast(&DataType::String)?;
    let values = as_str
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect();

    Ok(values)
}

/// Group row indices by label, with strata in sorted label order
fn strata(labels: &[String]) -> BTreeMap<&str, Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (row, label) in labels.iter().enumerate() {
        groups.entry(label.as_str()).or_default().push(row);
    }
    groups
}

/// Split a labeled table into train and holdout subsets, stratified on the label.
///
/// Each stratum of size `n` contributes `ceil(n * fraction)` rows (capped at
/// `n`) to the training side. One seeded RNG is threaded through the strata
/// in sorted label order, so the split is reproducible for a given seed.
pub fn stratified_split(
    df: &DataFrame,
    label: &str,
    fraction: f64,
    seed: u64,
) -> Result<Partition> {
    if !(fraction > 0.0 && fraction < 1.0) {
        return Err(PipelineError::InvalidFraction(fraction).into());
    }

    let labels = label_values(df, label)?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut train_rows: Vec<IdxSize> = Vec::with_capacity(labels.len());
    let mut holdout_rows: Vec<IdxSize> = Vec::with_capacity(labels.len());

    for (_, mut rows) in strata(&labels) {
        rows.shuffle(&mut rng);
        let n_train = ((rows.len() as f64) * fraction).ceil() as usize;
        let n_train = n_train.min(rows.len());

        train_rows.extend(rows[..n_train].iter().map(|&r| r as IdxSize));
        holdout_rows.extend(rows[n_train..].iter().map(|&r| r as IdxSize));
    }

    train_rows.sort_unstable();
    holdout_rows.sort_unstable();

    let train = take_rows(df, &train_rows)?;
    let holdout = take_rows(df, &holdout_rows)?;

    Ok(Partition {
        train,
        holdout,
        train_rows,
        holdout_rows,
    })
}

fn take_rows(df: &DataFrame, rows: &[IdxSize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec("idx".into(), rows.to_vec());
    Ok(df.take(&idx)?)
}

/// Proportion of rows per label, in sorted label order
pub fn label_distribution(df: &DataFrame, label: &str) -> Result<Vec<(String, f64)>> {
    let labels = label_values(df, label)?;
    let total = labels.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    Ok(strata(&labels)
        .into_iter()
        .map(|(class, rows)| (class.to_string(), rows.len() as f64 / total as f64))
        .collect())
}
