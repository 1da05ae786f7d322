//! Report module - summarizing reduction, evaluation and run results

pub mod evaluation;
pub mod run_report;
pub mod summary;

pub use evaluation::*;
pub use run_report::*;
pub use summary::*;
