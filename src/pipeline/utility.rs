//! Class-separation utility: MDL discretization, information gain and
//! correlation-based feature-subset selection (CFS)

use std::collections::HashSet;

use anyhow::Result;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::correlation::float_columns;
use super::error::PipelineError;

/// Merit improvements smaller than this do not count as progress
const MERIT_EPSILON: f64 = 1e-12;

/// Utility of a single feature with respect to the outcome label
#[derive(Debug, Clone, Serialize)]
pub struct FeatureUtility {
    pub feature_name: String,
    /// `H(label) - H(label | feature)`, in bits
    pub information_gain: f64,
    /// Information gain normalized to [0, 1]
    pub symmetric_uncertainty: f64,
    /// MDL cut points; empty when the feature carries no accepted split
    pub cut_points: Vec<f64>,
}

/// Features after MDL discretization against the label
#[derive(Debug, Clone)]
pub struct DiscretizedFeatures {
    pub names: Vec<String>,
    pub cut_points: Vec<Vec<f64>>,
    pub bins: Vec<Vec<usize>>,
}

impl DiscretizedFeatures {
    fn n_bins(&self, feature: usize) -> usize {
        self.cut_points[feature].len() + 1
    }
}

/// Subset chosen by the CFS search
#[derive(Debug, Clone, Serialize)]
pub struct CfsSelection {
    pub features: Vec<String>,
    pub merit: f64,
}

/// Shannon entropy (bits) of a count vector
fn entropy(counts: &[f64]) -> f64 {
    let total: f64 = counts.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0.0)
        .map(|&c| {
            let p = c / total;
            -p * p.log2()
        })
        .sum()
}

fn class_counts(pairs: &[(f64, u32)], n_classes: usize) -> Vec<f64> {
    let mut counts = vec![0.0; n_classes];
    for &(_, class) in pairs {
        counts[class as usize] += 1.0;
    }
    counts
}

fn distinct_classes(counts: &[f64]) -> f64 {
    counts.iter().filter(|&&c| c > 0.0).count() as f64
}

/// Recursive Fayyad-Irani split of a value-sorted slice
fn mdl_split(sorted: &[(f64, u32)], n_classes: usize, cuts: &mut Vec<f64>) {
    let n = sorted.len();
    if n < 2 {
        return;
    }

    let total = class_counts(sorted, n_classes);
    let h_total = entropy(&total);
    if h_total == 0.0 {
        return;
    }

    let mut left = vec![0.0; n_classes];
    let mut best: Option<(usize, f64)> = None;

    for i in 1..n {
        left[sorted[i - 1].1 as usize] += 1.0;
        if sorted[i - 1].0 >= sorted[i].0 {
            continue;
        }

        let right: Vec<f64> = total.iter().zip(left.iter()).map(|(t, l)| t - l).collect();
        let weighted = (i as f64 * entropy(&left) + (n - i) as f64 * entropy(&right)) / n as f64;

        if best.map_or(true, |(_, e)| weighted < e) {
            best = Some((i, weighted));
        }
    }

    let Some((cut, weighted)) = best else {
        return;
    };

    let left_counts = class_counts(&sorted[..cut], n_classes);
    let right_counts = class_counts(&sorted[cut..], n_classes);
    let (h_left, h_right) = (entropy(&left_counts), entropy(&right_counts));

    let k = distinct_classes(&total);
    let k1 = distinct_classes(&left_counts);
    let k2 = distinct_classes(&right_counts);

    let gain = h_total - weighted;
    let delta = (3f64.powf(k) - 2.0).log2() - (k * h_total - k1 * h_left - k2 * h_right);
    let n = n as f64;

    if gain <= ((n - 1.0).log2() + delta) / n {
        return;
    }

    cuts.push((sorted[cut - 1].0 + sorted[cut].0) / 2.0);
    mdl_split(&sorted[..cut], n_classes, cuts);
    mdl_split(&sorted[cut..], n_classes, cuts);
}

/// Cut points chosen by the MDL criterion, sorted ascending
pub fn mdl_cut_points(values: &[f64], labels: &[u32], n_classes: usize) -> Vec<f64> {
    let mut sorted: Vec<(f64, u32)> = values.iter().copied().zip(labels.iter().copied()).collect();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut cuts = Vec::new();
    mdl_split(&sorted, n_classes, &mut cuts);
    cuts.sort_by(f64::total_cmp);
    cuts
}

/// Bin index of every value given sorted cut points
pub fn apply_cut_points(values: &[f64], cuts: &[f64]) -> Vec<usize> {
    values
        .iter()
        .map(|&v| cuts.partition_point(|&c| c < v))
        .collect()
}

/// Information gain of `b` given `a`, plus both marginal entropies
fn mutual_information(a: &[usize], n_a: usize, b: &[usize], n_b: usize) -> (f64, f64, f64) {
    let mut joint = vec![0.0; n_a * n_b];
    let mut count_a = vec![0.0; n_a];
    let mut count_b = vec![0.0; n_b];

    for (&x, &y) in a.iter().zip(b.iter()) {
        joint[x * n_b + y] += 1.0;
        count_a[x] += 1.0;
        count_b[y] += 1.0;
    }

    let h_a = entropy(&count_a);
    let h_b = entropy(&count_b);
    let h_joint = entropy(&joint);

    ((h_a + h_b - h_joint).max(0.0), h_a, h_b)
}

fn symmetric_uncertainty(a: &[usize], n_a: usize, b: &[usize], n_b: usize) -> f64 {
    let (gain, h_a, h_b) = mutual_information(a, n_a, b, n_b);
    if h_a + h_b <= 0.0 {
        0.0
    } else {
        2.0 * gain / (h_a + h_b)
    }
}

/// Discretize every feature against the label.
///
/// Fails with a reducer contract error if any feature still holds nulls.
pub fn discretize_features(
    df: &DataFrame,
    features: &[String],
    labels: &[u32],
    n_classes: usize,
) -> Result<DiscretizedFeatures> {
    let columns = float_columns(df, features)?;

    let with_nulls: Vec<String> = features
        .iter()
        .zip(columns.iter())
        .filter(|(_, values)| values.iter().any(Option::is_none))
        .map(|(name, _)| name.clone())
        .collect();
    if !with_nulls.is_empty() {
        return Err(PipelineError::ReducerContract(with_nulls).into());
    }

    let discretized: Vec<(Vec<f64>, Vec<usize>)> = columns
        .par_iter()
        .map(|values| {
            let values: Vec<f64> = values.iter().map(|v| v.unwrap_or_default()).collect();
            let cuts = mdl_cut_points(&values, labels, n_classes);
            let bins = apply_cut_points(&values, &cuts);
            (cuts, bins)
        })
        .collect();

    let (cut_points, bins): (Vec<Vec<f64>>, Vec<Vec<usize>>) = discretized.into_iter().unzip();

    Ok(DiscretizedFeatures {
        names: features.to_vec(),
        cut_points,
        bins,
    })
}

/// Rank features by information gain with respect to the label.
///
/// Sorted by information gain descending; equal gains keep column order.
pub fn rank_features(
    discretized: &DiscretizedFeatures,
    labels: &[u32],
    n_classes: usize,
) -> Vec<FeatureUtility> {
    let labels: Vec<usize> = labels.iter().map(|&l| l as usize).collect();
    let mut utilities: Vec<FeatureUtility> = (0..discretized.names.len())
        .map(|f| {
            let n_bins = discretized.n_bins(f);
            let (gain, h_x, h_y) =
                mutual_information(&discretized.bins[f], n_bins, &labels, n_classes);
            let su = if h_x + h_y <= 0.0 {
                0.0
            } else {
                2.0 * gain / (h_x + h_y)
            };

            FeatureUtility {
                feature_name: discretized.names[f].clone(),
                information_gain: gain,
                symmetric_uncertainty: su,
                cut_points: discretized.cut_points[f].clone(),
            }
        })
        .collect();

    utilities.sort_by(|a, b| {
        b.information_gain
            .partial_cmp(&a.information_gain)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    utilities
}

/// CFS merit of a subset: `sum(r_cf) / sqrt(k + 2 * sum(r_ff))`
fn subset_merit(subset: &[usize], r_cf: &[f64], r_ff: &[Vec<f64>]) -> f64 {
    let k = subset.len();
    if k == 0 {
        return 0.0;
    }

    let sum_cf: f64 = subset.iter().map(|&f| r_cf[f]).sum();
    let mut sum_ff = 0.0;
    for (pos, &a) in subset.iter().enumerate() {
        for &b in &subset[pos + 1..] {
            sum_ff += r_ff[a][b];
        }
    }

    let denominator = (k as f64 + 2.0 * sum_ff).sqrt();
    if denominator <= 0.0 {
        0.0
    } else {
        sum_cf / denominator
    }
}

/// Select a feature subset with CFS and forward best-first search.
///
/// The search expands the most meritorious open subset by one feature at a
/// time and stops after `max_backtracks` consecutive expansions that fail to
/// beat the best merit seen. Open subsets with equal merit are expanded in
/// lexicographic order. The result may be empty when no feature correlates with the label.
pub fn select_cfs(
    discretized: &DiscretizedFeatures,
    labels: &[u32],
    n_classes: usize,
    max_backtracks: usize,
) -> CfsSelection {
    let p = discretized.names.len();
    let labels: Vec<usize> = labels.iter().map(|&l| l as usize).collect();

    let r_cf: Vec<f64> = (0..p)
        .into_par_iter()
        .map(|f| {
            symmetric_uncertainty(&discretized.bins[f], discretized.n_bins(f), &labels, n_classes)
        })
        .collect();

    let pairs: Vec<(usize, usize)> = (0..p)
        .flat_map(|i| ((i + 1)..p).map(move |j| (i, j)))
        .collect();
    let pair_su: Vec<(usize, usize, f64)> = pairs
        .par_iter()
        .map(|&(i, j)| {
            let su = symmetric_uncertainty(
                &discretized.bins[i],
                discretized.n_bins(i),
                &discretized.bins[j],
                discretized.n_bins(j),
            );
            (i, j, su)
        })
        .collect();

    let mut r_ff = vec![vec![0.0; p]; p];
    for (i, j, su) in pair_su {
        r_ff[i][j] = su;
        r_ff[j][i] = su;
    }

    let mut open: Vec<(f64, Vec<usize>)> = vec![(0.0, Vec::new())];
    let mut visited: HashSet<Vec<usize>> = HashSet::new();
    visited.insert(Vec::new());
    let mut best: (f64, Vec<usize>) = (0.0, Vec::new());
    let mut stale = 0;

    while !open.is_empty() {
        let pick = (0..open.len())
            .max_by(|&a, &b| {
                open[a]
                    .0
                    .partial_cmp(&open[b].0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| open[b].1.cmp(&open[a].1))
            })
            .unwrap_or(0);
        let (_, subset) = open.swap_remove(pick);

        let mut improved = false;
        for f in (0..p).filter(|f| !subset.contains(f)) {
            let mut child = subset.clone();
            child.push(f);
            child.sort_unstable();
            if !visited.insert(child.clone()) {
                continue;
            }

            let merit = subset_merit(&child, &r_cf, &r_ff);
            if merit > best.0 + MERIT_EPSILON {
                best = (merit, child.clone());
                improved = true;
            }
            open.push((merit, child));
        }

        if improved {
            stale = 0;
        } else {
            stale += 1;
            if stale >= max_backtracks {
                break;
            }
        }
    }

    CfsSelection {
        features: best.1.iter().map(|&f| discretized.names[f].clone()).collect(),
        merit: best.0,
    }
}
