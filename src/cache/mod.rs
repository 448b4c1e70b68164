//! Caching for coalition predictions

mod prediction;

pub use prediction::{CacheStats, PredictionCache};
