//! Feature reduction: metadata exclusion, null-column elimination,
//! correlation pruning and utility-based subset selection

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use super::correlation::{correlation_matrix, find_correlated_pairs, prune_correlated, CorrelatedPair};
use super::error::PipelineError;
use super::labels::LabelEncoding;
use super::missing::drop_null_columns;
use super::partition::label_values;
use super::utility::{discretize_features, rank_features, select_cfs, FeatureUtility};

/// Columns excluded from modeling before any analysis.
///
/// The sensor exports lead with seven bookkeeping columns (row index,
/// subject name, three timestamp columns and two window markers).
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetadataPolicy {
    /// Number of leading columns, by position, that are metadata
    pub skip_leading: usize,
    /// Additional metadata columns by name; names absent from the table are ignored
    pub names: Vec<String>,
}

impl MetadataPolicy {
    /// Policy for the raw sensor exports
    pub fn sensor_exports() -> Self {
        Self {
            skip_leading: 7,
            names: Vec::new(),
        }
    }

    /// Metadata columns present in `df`, in table order, never including `label`
    pub fn metadata_columns(&self, df: &DataFrame, label: &str) -> Vec<String> {
        df.get_column_names()
            .iter()
            .enumerate()
            .filter(|(pos, name)| {
                name.as_str() != label
                    && (*pos < self.skip_leading || self.names.iter().any(|n| n == name.as_str()))
            })
            .map(|(_, name)| name.to_string())
            .collect()
    }
}

/// Thresholds and search settings for reduction
#[derive(Debug, Clone, Serialize)]
pub struct ReducerConfig {
    pub label: String,
    pub metadata: MetadataPolicy,
    /// Pairs with absolute correlation strictly above this are pruned
    pub correlation_threshold: f64,
    /// Non-improving CFS expansions tolerated before the search stops
    pub max_backtracks: usize,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            label: "classe".to_string(),
            metadata: MetadataPolicy::sensor_exports(),
            correlation_threshold: 0.7,
            max_backtracks: 5,
        }
    }
}

/// Everything the reducer decided, pass by pass
#[derive(Debug, Clone, Serialize)]
pub struct ReductionOutcome {
    /// Candidate features before any pass (label and metadata excluded)
    pub initial_features: Vec<String>,
    pub dropped_metadata: Vec<String>,
    pub dropped_null: Vec<String>,
    pub correlated_pairs: Vec<CorrelatedPair>,
    pub dropped_correlation: Vec<String>,
    /// Features surviving correlation pruning, in column order
    pub surviving: Vec<String>,
    pub utilities: Vec<FeatureUtility>,
    /// CFS merit of the selected subset (0 when the fallback was used)
    pub merit: f64,
    pub selected: Vec<String>,
}

/// Runs the reduction passes over a training split.
///
/// A pure function of the input frame and the configuration.
#[derive(Debug, Clone)]
pub struct FeatureReducer {
    config: ReducerConfig,
}

impl FeatureReducer {
    pub fn new(config: ReducerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    pub fn reduce(&self, train: &DataFrame) -> Result<ReductionOutcome> {
        let label = self.config.label.as_str();
        let labels = label_values(train, label)?;
        let encoding = LabelEncoding::fit(&labels);
        let encoded = encoding.encode(&labels)?;

        // Metadata
        let dropped_metadata = self.config.metadata.metadata_columns(train, label);
        let features_frame = train.drop_many(
            dropped_metadata
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(label)),
        );
        let initial_features: Vec<String> = features_frame
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        // Pass a: nulls and non-numeric columns
        let (complete, dropped_null) = drop_null_columns(&features_frame, &[])?;
        let complete_features: Vec<String> = complete
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let with_nulls: Vec<String> = complete
            .get_columns()
            .iter()
            .filter(|col| col.null_count() > 0)
            .map(|col| col.name().to_string())
            .collect();
        if !with_nulls.is_empty() {
            return Err(PipelineError::ReducerContract(with_nulls).into());
        }

        if complete_features.is_empty() {
            return Err(PipelineError::EmptySelection.into());
        }

        // Pass b: correlation pruning
        let matrix = correlation_matrix(&complete, &complete_features)?;
        let threshold = self.config.correlation_threshold;
        let correlated_pairs = find_correlated_pairs(&matrix, threshold);
        let dropped_correlation = prune_correlated(&matrix, threshold);
        let surviving: Vec<String> = complete_features
            .iter()
            .filter(|f| !dropped_correlation.contains(f))
            .cloned()
            .collect();

        // Pass c: utility ranking and subset selection
        let discretized = discretize_features(&complete, &surviving, &encoded, encoding.len())?;
        let utilities = rank_features(&discretized, &encoded, encoding.len());
        let cfs = select_cfs(
            &discretized,
            &encoded,
            encoding.len(),
            self.config.max_backtracks,
        );

        let (selected, merit) = if cfs.features.is_empty() {
            let top = utilities
                .first()
                .map(|u| u.feature_name.clone())
                .ok_or(PipelineError::EmptySelection)?;
            (vec![top], 0.0)
        } else {
            (cfs.features, cfs.merit)
        };

        Ok(ReductionOutcome {
            initial_features,
            dropped_metadata,
            dropped_null,
            correlated_pairs,
            dropped_correlation,
            surviving,
            utilities,
            merit,
            selected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_policy_positions_and_names() {
        let df = df! {
            "row" => [1i32, 2],
            "user" => ["a", "b"],
            "gyro_x" => [0.1f64, 0.2],
            "window" => [1i32, 1],
            "classe" => ["A", "B"],
        }
        .unwrap();

        let policy = MetadataPolicy {
            skip_leading: 2,
            names: vec!["window".to_string(), "not_there".to_string()],
        };

        assert_eq!(
            policy.metadata_columns(&df, "classe"),
            vec!["row", "user", "window"]
        );
    }

    #[test]
    fn test_metadata_policy_never_takes_label() {
        let df = df! {
            "classe" => ["A", "B"],
            "gyro_x" => [0.1f64, 0.2],
        }
        .unwrap();

        let policy = MetadataPolicy {
            skip_leading: 1,
            names: Vec::new(),
        };

        assert!(policy.metadata_columns(&df, "classe").is_empty());
    }
}
