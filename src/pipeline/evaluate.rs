//! Holdout evaluation via confusion matrix

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

use super::error::PipelineError;
use super::forest::ForestBackend;
use super::partition::label_values;
use super::trainer::TrainedModel;

/// Per-class statistics derived from the confusion matrix
#[derive(Debug, Clone, Serialize)]
pub struct ClassStats {
    pub class: String,
    /// True positives over actual positives (recall)
    pub sensitivity: f64,
    /// True negatives over actual negatives
    pub specificity: f64,
    /// True positives over predicted positives
    pub precision: f64,
}

/// Predicted x reference count table.
///
/// `counts[p][a]` is the number of rows predicted as class `p` whose actual
/// class is `a`.
#[derive(Debug, Clone, Serialize)]
pub struct ConfusionMatrix {
    pub classes: Vec<String>,
    pub counts: Vec<Vec<usize>>,
}

impl ConfusionMatrix {
    /// Tabulate predictions against reference labels
    pub fn from_labels(
        classes: &[String],
        predicted: &[String],
        actual: &[String],
    ) -> Result<Self, PipelineError> {
        let index = |label: &String| {
            classes
                .iter()
                .position(|c| c == label)
                .ok_or_else(|| PipelineError::UnseenLabel(label.clone()))
        };

        let mut counts = vec![vec![0; classes.len()]; classes.len()];
        for (p, a) in predicted.iter().zip(actual.iter()) {
            counts[index(p)?][index(a)?] += 1;
        }

        Ok(Self {
            classes: classes.to_vec(),
            counts,
        })
    }

    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    pub fn correct(&self) -> usize {
        (0..self.classes.len()).map(|i| self.counts[i][i]).sum()
    }

    /// Trace over total; 0 for an empty table
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.correct() as f64 / total as f64
        }
    }

    pub fn accuracy_pct(&self) -> f64 {
        self.accuracy() * 100.0
    }

    pub fn error_rate(&self) -> f64 {
        1.0 - self.accuracy()
    }

    fn predicted_total(&self, class: usize) -> usize {
        self.counts[class].iter().sum()
    }

    fn actual_total(&self, class: usize) -> usize {
        self.counts.iter().map(|row| row[class]).sum()
    }

    /// Cohen's kappa: agreement corrected for chance
    pub fn kappa(&self) -> f64 {
        let total = self.total() as f64;
        if total == 0.0 {
            return 0.0;
        }

        let observed = self.accuracy();
        let expected: f64 = (0..self.classes.len())
            .map(|c| (self.predicted_total(c) as f64 / total) * (self.actual_total(c) as f64 / total))
            .sum();

        if (1.0 - expected).abs() < f64::EPSILON {
            0.0
        } else {
            (observed - expected) / (1.0 - expected)
        }
    }

    pub fn class_stats(&self) -> Vec<ClassStats> {
        let total = self.total();
        let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };

        (0..self.classes.len())
            .map(|c| {
                let tp = self.counts[c][c];
                let actual = self.actual_total(c);
                let predicted = self.predicted_total(c);
                let tn = total + tp - actual - predicted;

                ClassStats {
                    class: self.classes[c].clone(),
                    sensitivity: ratio(tp, actual),
                    specificity: ratio(tn, total - actual),
                    precision: ratio(tp, predicted),
                }
            })
            .collect()
    }
}

/// Apply a trained model to a labeled holdout and tabulate the result
pub fn evaluate<B>(
    model: &TrainedModel<B::Model>,
    backend: &B,
    holdout: &DataFrame,
) -> Result<ConfusionMatrix>
where
    B: ForestBackend,
{
    let actual = label_values(holdout, &model.label)?;
    let predicted = model.predict_frame(backend, holdout)?;
    Ok(ConfusionMatrix::from_labels(
        &model.encoding.classes,
        &predicted,
        &actual,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_accuracy_is_trace_over_total() {
        let classes = strings(&["A", "B", "C"]);
        let predicted = strings(&["A", "A", "B", "C", "C", "C"]);
        let actual = strings(&["A", "B", "B", "C", "C", "A"]);

        let cm = ConfusionMatrix::from_labels(&classes, &predicted, &actual).unwrap();

        assert_eq!(cm.total(), 6);
        assert_eq!(cm.correct(), 4);
        assert!((cm.accuracy() - 4.0 / 6.0).abs() < 1e-12);
        assert!((cm.error_rate() - 2.0 / 6.0).abs() < 1e-12);
        assert_eq!(cm.counts[0][1], 1, "one B predicted as A");
        assert_eq!(cm.counts[2][0], 1, "one A predicted as C");
    }

    #[test]
    fn test_perfect_agreement_kappa_is_one() {
        let classes = strings(&["A", "B"]);
        let labels = strings(&["A", "B", "A", "B"]);
        let cm = ConfusionMatrix::from_labels(&classes, &labels, &labels).unwrap();
        assert!((cm.kappa() - 1.0).abs() < 1e-12);
        for stats in cm.class_stats() {
            assert_eq!(stats.sensitivity, 1.0);
            assert_eq!(stats.specificity, 1.0);
            assert_eq!(stats.precision, 1.0);
        }
    }

    #[test]
    fn test_class_stats() {
        let classes = strings(&["A", "B"]);
        let predicted = strings(&["A", "A", "B", "B"]);
        let actual = strings(&["A", "B", "B", "B"]);
        let cm = ConfusionMatrix::from_labels(&classes, &predicted, &actual).unwrap();
        let stats = cm.class_stats();

        assert_eq!(stats[0].sensitivity, 1.0);
        assert_eq!(stats[0].precision, 0.5);
        assert!((stats[1].sensitivity - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(stats[1].specificity, 1.0);
    }

    #[test]
    fn test_unknown_label_rejected() {
        let classes = strings(&["A"]);
        let err = ConfusionMatrix::from_labels(&classes, &strings(&["A"]), &strings(&["Q"]));
        assert!(err.is_err());
    }
}
