//! Rep-grade: Exercise Repetition Grading Library
//!
//! A library for grading weight-lifting repetitions from body-worn sensor
//! exports: stratified partitioning, null-column elimination,
//! correlation pruning, information-gain subset selection and a
//! cross-validated random forest.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
