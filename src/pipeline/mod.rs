//! Pipeline module - loading, partitioning, reduction, training and evaluation

pub mod artifact;
pub mod config;
pub mod correlation;
pub mod error;
pub mod evaluate;
pub mod forest;
pub mod labels;
pub mod loader;
pub mod missing;
pub mod partition;
pub mod reducer;
pub mod trainer;
pub mod utility;

pub use artifact::*;
pub use config::*;
pub use correlation::*;
pub use error::*;
pub use evaluate::*;
pub use forest::*;
pub use labels::*;
pub use loader::*;
pub use missing::*;
pub use partition::*;
pub use reducer::*;
pub use trainer::*;
pub use utility::*;
