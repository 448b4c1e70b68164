//! Shapley Attribution - exact global feature attribution for black-box models
//!
//! Given a feature table and any deterministic scoring model, this crate
//! measures how much each feature contributes to the model's mean output, in
//! magnitude and in direction, by scoring every coalition of features with the
//! absent ones masked to zero.
//!
//! # Modules
//!
//! - [`explainability`] - coalitions, scoring adapter, enumeration, normalization
//! - [`cache`] - compute-once prediction cache shared by worker threads
//! - [`config`] - run configuration (threads, feature guard, weighting, deadline)
//! - [`utils`] - parallelism, cancellation and data loading helpers
//! - [`cli`] - command-line interface
//!
//! # Example
//!
//! ```ignore
//! use shapley_attribution::prelude::*;
//! use polars::prelude::*;
//!
//! let df = df!("a" => &[1.0, 2.0], "b" => &[0.5, 0.1], "y" => &[2.0, 4.0])?;
//! let model = LinearScorer::new(vec![2.0, 0.0], 0.0);
//! let table = compute_attribution(&df, "y", &model)?;
//! println!("{}", table);
//! ```

pub mod error;
pub mod config;

pub mod cache;
pub mod explainability;
pub mod utils;

pub mod cli;

pub use config::{AttributionConfig, Weighting};
pub use error::{AttributionError, Result};

use explainability::{AttributionTable, CoalitionExplainer, FeatureMatrix, ScoringModel};
use polars::prelude::DataFrame;

/// Attribute `model`'s mean prediction over `df` to every column except `target`,
/// using the default configuration.
pub fn compute_attribution<M>(df: &DataFrame, target: &str, model: &M) -> Result<AttributionTable>
where
    M: ScoringModel + ?Sized,
{
    compute_attribution_with_config(df, target, model, AttributionConfig::default())
}

/// [`compute_attribution`] with an explicit configuration
pub fn compute_attribution_with_config<M>(
    df: &DataFrame,
    target: &str,
    model: &M,
    config: AttributionConfig,
) -> Result<AttributionTable>
where
    M: ScoringModel + ?Sized,
{
    let matrix = FeatureMatrix::from_dataframe(df, target)?;
    if matrix.n_features() == 0 {
        return Err(AttributionError::InvalidInput(format!(
            "no feature columns left after removing target '{}'",
            target
        )));
    }
    CoalitionExplainer::new(model).with_config(config).explain(&matrix)
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cache::{CacheStats, PredictionCache};
    pub use crate::config::{AttributionConfig, Weighting};
    pub use crate::error::{AttributionError, Result};
    pub use crate::explainability::{
        AttributionTable, Coalition, CoalitionExplainer, FeatureAttribution, FeatureMatrix,
        FeatureSet, LinearScorer, ScoringModel,
    };
    pub use crate::utils::CancellationToken;
    pub use crate::{compute_attribution, compute_attribution_with_config};
}
