//! Utility functions and types

mod cancel;
mod parallel;
pub mod data_loader;

pub use cancel::CancellationToken;
pub(crate) use cancel::StopCondition;
pub use data_loader::DataLoader;
pub use parallel::ParallelConfig;
