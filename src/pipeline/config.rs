//! Run configuration shared by every stage

use serde::Serialize;

use super::loader::LoadOptions;
use super::reducer::{MetadataPolicy, ReducerConfig};
use super::trainer::TrainerConfig;

/// Explicit configuration for one end-to-end run.
///
/// The label column and seed are stored once here and copied into the
/// stage configs by the accessors, so the stages never disagree.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineConfig {
    pub label: String,
    pub train_fraction: f64,
    pub seed: u64,
    pub load: LoadOptions,
    pub metadata: MetadataPolicy,
    pub correlation_threshold: f64,
    pub max_backtracks: usize,
    pub trees: u16,
    pub folds: usize,
    pub workers: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let reducer = ReducerConfig::default();
        let trainer = TrainerConfig::default();
        Self {
            label: reducer.label,
            train_fraction: 0.8,
            seed: trainer.seed,
            load: LoadOptions::default(),
            metadata: reducer.metadata,
            correlation_threshold: reducer.correlation_threshold,
            max_backtracks: reducer.max_backtracks,
            trees: trainer.trees,
            folds: trainer.folds,
            workers: trainer.workers,
        }
    }
}

impl PipelineConfig {
    pub fn reducer(&self) -> ReducerConfig {
        ReducerConfig {
            label: self.label.clone(),
            metadata: self.metadata.clone(),
            correlation_threshold: self.correlation_threshold,
            max_backtracks: self.max_backtracks,
        }
    }

    pub fn trainer(&self) -> TrainerConfig {
        TrainerConfig {
            label: self.label.clone(),
            trees: self.trees,
            folds: self.folds,
            seed: self.seed,
            workers: self.workers,
        }
    }

    /// Name of the column appended to the test table
    pub fn prediction_column(&self) -> String {
        format!("predicted_{}", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = PipelineConfig::default();
        assert_eq!(config.label, "classe");
        assert_eq!(config.train_fraction, 0.8);
        assert_eq!(config.correlation_threshold, 0.7);
        assert_eq!(config.trees, 100);
        assert_eq!(config.folds, 2);
        assert_eq!(config.metadata.skip_leading, 7);
        assert_eq!(config.prediction_column(), "predicted_classe");
    }

    #[test]
    fn test_stage_configs_share_label_and_seed() {
        let config = PipelineConfig {
            label: "grade".to_string(),
            seed: 99,
            ..Default::default()
        };
        assert_eq!(config.reducer().label, "grade");
        assert_eq!(config.trainer().label, "grade");
        assert_eq!(config.trainer().seed, 99);
    }
}
