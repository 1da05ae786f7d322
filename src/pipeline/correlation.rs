//! Correlation-based feature reduction

use anyhow::Result;
use faer::Mat;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

/// Represents a correlated pair of features
#[derive(Debug, Clone, Serialize)]
pub struct CorrelatedPair {
    pub feature1: String,
    pub feature2: String,
    pub correlation: f64,
}

/// Pearson correlation matrix over a fixed, ordered set of columns.
///
/// The diagonal is zero so that scanning for the largest entry never lands
/// on a self-correlation. Degenerate pairs (zero variance, or fewer than two
/// rows where both sides are present) are stored as zero.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub names: Vec<String>,
    pub values: Mat<f64>,
}

impl CorrelationMatrix {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Correlation between two columns by name
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.names.iter().position(|n| n == a)?;
        let j = self.names.iter().position(|n| n == b)?;
        Some(self.values[(i, j)])
    }
}

/// Cast the named columns to Float64 and materialize them as optional values
pub fn float_columns(df: &DataFrame, columns: &[String]) -> Result<Vec<Vec<Option<f64>>>> {
    columns
        .iter()
        .map(|name| -> Result<Vec<Option<f64>>> {
            let col = df.column(name)?.cast(&DataType::Float64)?;
            Ok(col.f64()?.into_iter().collect())
        })
        .collect()
}

/// Compute Pearson correlation over the rows where both values are present.
///
/// Uses a single-pass Welford update for numerical stability. Returns `None`
/// when fewer than two complete rows exist or either side is constant.
fn compute_pairwise_complete_correlation(x: &[Option<f64>], y: &[Option<f64>]) -> Option<f64> {
    if x.len() != y.len() {
        return None;
    }

    let mut n = 0.0;
    let mut mean_x = 0.0;
    let mut mean_y = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    let mut cov_xy = 0.0;

    for (a, b) in x.iter().zip(y.iter()) {
        if let (Some(a), Some(b)) = (a, b) {
            n += 1.0;
            let dx = a - mean_x;
            let dy = b - mean_y;
            mean_x += dx / n;
            mean_y += dy / n;
            var_x += dx * (a - mean_x);
            var_y += dy * (b - mean_y);
            cov_xy += dx * (b - mean_y);
        }
    }

    if n < 2.0 || var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }

    let r = cov_xy / (var_x.sqrt() * var_y.sqrt());
    if r.is_nan() {
        None
    } else {
        Some(r.clamp(-1.0, 1.0))
    }
}

/// Build the correlation matrix for `columns` of `df`.
///
/// Pairs are computed in parallel with Rayon over the upper triangle and
/// mirrored, so the result is symmetric by construction.
pub fn correlation_matrix(df: &DataFrame, columns: &[String]) -> Result<CorrelationMatrix> {
    let data = float_columns(df, columns)?;
    Ok(correlation_matrix_from_columns(columns.to_vec(), &data))
}

/// Build the correlation matrix from already materialized columns
pub fn correlation_matrix_from_columns(
    names: Vec<String>,
    data: &[Vec<Option<f64>>],
) -> CorrelationMatrix {
    let n = names.len();

    let pairs: Vec<(usize, usize)> = (0..n)
        .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
        .collect();

    let correlations: Vec<(usize, usize, f64)> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let r = compute_pairwise_complete_correlation(&data[i], &data[j]).unwrap_or(0.0);
            (i, j, r)
        })
        .collect();

    let mut values = Mat::<f64>::zeros(n, n);
    for (i, j, r) in correlations {
        values[(i, j)] = r;
        values[(j, i)] = r;
    }

    CorrelationMatrix { names, values }
}

/// Extract pairs whose absolute correlation is strictly above `threshold`,
/// sorted by absolute correlation descending
pub fn find_correlated_pairs(matrix: &CorrelationMatrix, threshold: f64) -> Vec<CorrelatedPair> {
    let n = matrix.len();
    let mut pairs = Vec::new();

    for i in 0..n {
        for j in (i + 1)..n {
            let corr = matrix.values[(i, j)];
            if corr.abs() > threshold {
                pairs.push(CorrelatedPair {
                    feature1: matrix.names[i].clone(),
                    feature2: matrix.names[j].clone(),
                    correlation: corr,
                });
            }
        }
    }

    pairs.sort_by(|a, b| {
        b.correlation
            .abs()
            .partial_cmp(&a.correlation.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    pairs
}

/// Greedily remove columns until no remaining pair exceeds `threshold`.
///
/// Each round takes the remaining pair with the largest absolute
/// correlation (first in column order on equal values) and drops one side:
///
/// 1. the column in more above-threshold pairs among the remaining columns;
/// 2. otherwise the column with the higher mean absolute correlation to the
///    other remaining columns;
/// 3. otherwise the column that comes later in column order.
///
/// Returns the dropped columns in the order they were removed.
pub fn prune_correlated(matrix: &CorrelationMatrix, threshold: f64) -> Vec<String> {
    let n = matrix.len();
    let abs = |i: usize, j: usize| matrix.values[(i, j)].abs();
    let mut alive = vec![true; n];
    let mut dropped = Vec::new();

    loop {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in (0..n).filter(|&i| alive[i]) {
            for j in ((i + 1)..n).filter(|&j| alive[j]) {
                let r = abs(i, j);
                if best.map_or(true, |(_, _, b)| r > b) {
                    best = Some((i, j, r));
                }
            }
        }

        let (i, j) = match best {
            Some((i, j, r)) if r > threshold => (i, j),
            _ => break,
        };

        let remaining: Vec<usize> = (0..n).filter(|&k| alive[k]).collect();
        let high_count = |c: usize| {
            remaining
                .iter()
                .filter(|&&k| k != c && abs(c, k) > threshold)
                .count()
        };
        let mean_abs = |c: usize| {
            let others = remaining.len().saturating_sub(1).max(1) as f64;
            remaining.iter().filter(|&&k| k != c).map(|&k| abs(c, k)).sum::<f64>() / others
        };

        let (count_i, count_j) = (high_count(i), high_count(j));
        let victim = if count_i != count_j {
            if count_i > count_j {
                i
            } else {
                j
            }
        } else {
            let (mean_i, mean_j) = (mean_abs(i), mean_abs(j));
            if mean_i > mean_j {
                i
            } else {
                // j is later in column order, so it also wins exact ties
                j
            }
        };

        alive[victim] = false;
        dropped.push(matrix.names[victim].clone());
    }

    dropped
}
