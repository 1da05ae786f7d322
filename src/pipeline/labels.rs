//! Outcome label encoding

use serde::{Deserialize, Serialize};

use super::error::PipelineError;

/// Maps outcome label strings to dense class indices.
///
/// Classes are the sorted distinct training labels, so grade `A` is index 0
/// for the sensor dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncoding {
    pub classes: Vec<String>,
}

impl LabelEncoding {
    pub fn fit(values: &[String]) -> Self {
        let mut classes: Vec<String> = values.to_vec();
        classes.sort();
        classes.dedup();
        Self { classes }
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn index_of(&self, label: &str) -> Option<u32> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(label))
            .ok()
            .map(|i| i as u32)
    }

    pub fn encode(&self, values: &[String]) -> Result<Vec<u32>, PipelineError> {
        values
            .iter()
            .map(|v| {
                self.index_of(v)
                    .ok_or_else(|| PipelineError::UnseenLabel(v.clone()))
            })
            .collect()
    }

    pub fn decode(&self, index: u32) -> Result<&str, PipelineError> {
        self.classes
            .get(index as usize)
            .map(String::as_str)
            .ok_or(PipelineError::UnknownLabel(index))
    }

    pub fn decode_all(&self, indices: &[u32]) -> Result<Vec<String>, PipelineError> {
        indices
            .iter()
            .map(|&i| self.decode(i).map(str::to_string))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_classes_sorted_and_unique() {
        let enc = LabelEncoding::fit(&strings(&["C", "A", "E", "A", "B", "D"]));
        assert_eq!(enc.classes, strings(&["A", "B", "C", "D", "E"]));
        assert_eq!(enc.index_of("D"), Some(3));
    }

    #[test]
    fn test_encode_rejects_unseen_label() {
        let enc = LabelEncoding::fit(&strings(&["A", "B"]));
        let err = enc.encode(&strings(&["A", "Z"])).unwrap_err();
        assert!(matches!(err, PipelineError::UnseenLabel(ref l) if l == "Z"));
    }

    #[test]
    fn test_decode_out_of_range() {
        let enc = LabelEncoding::fit(&strings(&["A", "B"]));
        assert_eq!(enc.decode(1).unwrap(), "B");
        assert!(matches!(enc.decode(7), Err(PipelineError::UnknownLabel(7))));
    }
}
