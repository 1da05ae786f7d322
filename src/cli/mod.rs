//! CLI module - argument parsing and the predict subcommand

mod args;
pub mod predict;

pub use args::{derive_path, derive_predictions_path, Cli, Commands};
pub use predict::run_predict;
