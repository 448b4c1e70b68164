//! Model explainability module
//!
//! Dataset-level feature attribution for black-box scoring models by exact
//! enumeration of feature coalitions:
//! - [`FeatureSet`] / [`Coalition`] - feature catalog and bitmask subsets
//! - [`ScoringAdapter`] - coalition -> mean masked prediction
//! - [`CoalitionExplainer`] - drives the enumeration, fills the cache,
//!   accumulates marginal contributions
//! - [`Normalizer`] / [`AttributionTable`] - ranked percentage output
//!
//! Cost is `2^n` model calls for `n` features, so this is meant for narrow
//! feature sets. Sampling approximations are a different algorithm and are
//! not substituted here.

mod accumulator;
mod coalition;
mod explainer;
mod matrix;
mod scoring;
mod table;

pub use accumulator::AttributionAccumulator;
pub use coalition::{binomial, Coalition, Combinations, FeatureSet, Members};
pub use explainer::CoalitionExplainer;
pub use matrix::FeatureMatrix;
pub use scoring::{LinearScorer, ScoringAdapter, ScoringModel};
pub use table::{round_to, AttributionTable, FeatureAttribution, Normalizer, RunStats};
