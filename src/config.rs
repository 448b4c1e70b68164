//! Attribution run configuration

use crate::error::{AttributionError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Widest coalition bitmask supported by [`crate::explainability::Coalition`]
pub const HARD_MAX_FEATURES: usize = 63;

/// How marginal contributions are weighted before accumulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    /// Every marginal contribution counts once
    #[default]
    Unweighted,
    /// Scale by `(s-1)! (n-s)! / n!` for a coalition of size `s`.
    /// The signed sums then equal classical Shapley values.
    Shapley,
}

impl Weighting {
    /// Weight applied to a marginal contribution of a coalition of `size`
    /// features drawn from `n_features`.
    pub fn factor(self, n_features: usize, size: usize) -> f64 {
        match self {
            Weighting::Unweighted => 1.0,
            Weighting::Shapley => {
                if size == 0 || size > n_features {
                    return 0.0;
                }
                // (s-1)!(n-s)!/n! == 1 / (n * C(n-1, s-1))
                let k = size - 1;
                let m = n_features - 1;
                let k = k.min(m - k);
                let mut binom = 1.0f64;
                for i in 0..k {
                    binom = binom * (m - i) as f64 / (i + 1) as f64;
                }
                1.0 / (n_features as f64 * binom)
            }
        }
    }
}

impl std::str::FromStr for Weighting {
    type Err = AttributionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "unweighted" | "none" => Ok(Weighting::Unweighted),
            "shapley" => Ok(Weighting::Shapley),
            other => Err(AttributionError::ConfigError(format!(
                "unknown weighting '{}', expected 'unweighted' or 'shapley'",
                other
            ))),
        }
    }
}

/// Configuration for a single attribution run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionConfig {
    /// Number of worker threads (None = global rayon pool, 1 = sequential)
    pub n_threads: Option<usize>,

    /// Largest feature count accepted; the run costs 2^n model evaluations
    pub max_features: usize,

    /// Weighting of marginal contributions
    pub weighting: Weighting,

    /// Decimal places kept in the percentage columns
    pub decimals: u32,

    /// Deadline for the whole run, in milliseconds
    pub timeout_ms: Option<u64>,
}

impl Default for AttributionConfig {
    fn default() -> Self {
        Self {
            n_threads: None,
            max_features: 20,
            weighting: Weighting::Unweighted,
            decimals: 1,
            timeout_ms: None,
        }
    }
}

impl AttributionConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set number of threads
    pub fn with_n_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = Some(n_threads);
        self
    }

    /// Builder method to set the feature-count guard
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = max_features;
        self
    }

    /// Builder method to set the weighting scheme
    pub fn with_weighting(mut self, weighting: Weighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Builder method to set rounding precision
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    /// Builder method to set a run deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// The run deadline as a `Duration`
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if self.max_features == 0 {
            return Err(AttributionError::ConfigError(
                "max_features must be > 0".to_string(),
            ));
        }
        if self.max_features > HARD_MAX_FEATURES {
            return Err(AttributionError::ConfigError(format!(
                "max_features must be <= {}, got {}",
                HARD_MAX_FEATURES, self.max_features
            )));
        }
        if self.n_threads == Some(0) {
            return Err(AttributionError::ConfigError(
                "n_threads must be > 0 when set".to_string(),
            ));
        }
        if self.decimals > 10 {
            return Err(AttributionError::ConfigError(format!(
                "decimals must be <= 10, got {}",
                self.decimals
            )));
        }
        Ok(())
    }

    /// Save the configuration as pretty JSON
    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a configuration from a JSON file
    pub fn load(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }
}
