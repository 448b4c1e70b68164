//! Normalization of accumulated sums into the ranked attribution table

use super::accumulator::AttributionAccumulator;
use super::coalition::FeatureSet;
use crate::config::Weighting;
use crate::error::{AttributionError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// One ranked row of the attribution table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureAttribution {
    /// Feature name
    pub feature: String,
    /// Share of total magnitude, in percent
    pub magnitude_pct: f64,
    /// Signed share of total absolute direction, in percent
    pub direction_pct: f64,
    /// Raw sum of absolute marginal contributions
    pub magnitude: f64,
    /// Raw signed sum of marginal contributions
    pub direction: f64,
}

/// Counters describing how a run went
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub n_features: usize,
    pub n_rows: usize,
    /// Distinct coalitions the model was asked to score
    pub coalitions_evaluated: usize,
    /// Marginal contributions fed to the accumulator
    pub marginal_updates: usize,
    pub cache_hits: usize,
    pub elapsed_ms: u64,
}

/// Ranked attribution table, sorted by descending `magnitude_pct` then name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionTable {
    pub rows: Vec<FeatureAttribution>,
    /// Mean prediction with every feature present
    pub base_value: f64,
    /// Mean prediction with every feature masked
    pub empty_value: Option<f64>,
    pub weighting: Weighting,
    /// True when Σ magnitude was zero and every magnitude_pct was reported as 0
    pub magnitude_undefined: bool,
    /// True when Σ |direction| was zero and every direction_pct was reported as 0
    pub direction_undefined: bool,
    pub stats: RunStats,
}

impl AttributionTable {
    /// Table for a run with no features
    pub fn empty(weighting: Weighting) -> Self {
        Self {
            rows: Vec::new(),
            base_value: 0.0,
            empty_value: None,
            weighting,
            magnitude_undefined: true,
            direction_undefined: true,
            stats: RunStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FeatureAttribution> {
        self.rows.iter()
    }

    /// Row for `feature`
    pub fn get(&self, feature: &str) -> Option<&FeatureAttribution> {
        self.rows.iter().find(|r| r.feature == feature)
    }

    /// The `k` highest-ranked rows
    pub fn top_k(&self, k: usize) -> &[FeatureAttribution] {
        &self.rows[..k.min(self.rows.len())]
    }

    /// Whether either percentage column fell back to zeros
    pub fn is_degenerate(&self) -> bool {
        self.magnitude_undefined || self.direction_undefined
    }

    /// Serialize as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Ranked rows as a DataFrame with columns
    /// `feature`, `magnitude_pct`, `direction_pct`, `magnitude`, `direction`
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let features: Vec<&str> = self.rows.iter().map(|r| r.feature.as_str()).collect();
        let magnitude_pct: Vec<f64> = self.rows.iter().map(|r| r.magnitude_pct).collect();
        let direction_pct: Vec<f64> = self.rows.iter().map(|r| r.direction_pct).collect();
        let magnitude: Vec<f64> = self.rows.iter().map(|r| r.magnitude).collect();
        let direction: Vec<f64> = self.rows.iter().map(|r| r.direction).collect();

        let df = df!(
            "feature" => features,
            "magnitude_pct" => magnitude_pct,
            "direction_pct" => direction_pct,
            "magnitude" => magnitude,
            "direction" => direction
        )?;
        Ok(df)
    }
}

impl<'a> IntoIterator for &'a AttributionTable {
    type Item = &'a FeatureAttribution;
    type IntoIter = std::slice::Iter<'a, FeatureAttribution>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl fmt::Display for AttributionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|r| r.feature.len())
            .chain(std::iter::once("feature".len()))
            .max()
            .unwrap_or(7);

        writeln!(
            f,
            "{:<width$}  {:>13}  {:>13}",
            "feature",
            "magnitude_pct",
            "direction_pct",
            width = width
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<width$}  {:>13}  {:>13}",
                row.feature,
                row.magnitude_pct,
                row.direction_pct,
                width = width
            )?;
        }
        Ok(())
    }
}

/// Round half away from zero to `decimals` places; `-0.0` becomes `0.0`
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Turns finished accumulators into the ranked percentage table.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    decimals: u32,
}

impl Normalizer {
    pub fn new(decimals: u32) -> Self {
        Self { decimals }
    }

    /// Build the table. A zero total for either column is reported as all-zero
    /// percentages with the matching `*_undefined` flag set; a non-finite total
    /// is an error.
    pub fn normalize(
        &self,
        features: &FeatureSet,
        accumulator: &AttributionAccumulator,
        weighting: Weighting,
    ) -> Result<AttributionTable> {
        let magnitude = accumulator.magnitude();
        let direction = accumulator.direction();

        let magnitude_total: f64 = magnitude.iter().sum();
        let direction_total: f64 = direction.iter().map(|d| d.abs()).sum();

        if !magnitude_total.is_finite() || !direction_total.is_finite() {
            return Err(AttributionError::DataError(format!(
                "attribution totals are not finite (magnitude {}, direction {})",
                magnitude_total, direction_total
            )));
        }

        let magnitude_undefined = magnitude_total == 0.0;
        let direction_undefined = direction_total == 0.0;

        if magnitude_undefined && !features.is_empty() {
            warn!("total magnitude is zero; the model output did not vary with any coalition");
        }
        if direction_undefined && !magnitude_undefined {
            warn!("total direction is zero; reporting zero direction for every feature");
        }

        let share = |value: f64, total: f64, undefined: bool| -> f64 {
            if undefined {
                0.0
            } else {
                round_to(100.0 * value / total, self.decimals)
            }
        };

        let mut rows: Vec<FeatureAttribution> = features
            .names()
            .iter()
            .enumerate()
            .map(|(idx, name)| FeatureAttribution {
                feature: name.clone(),
                magnitude_pct: share(magnitude[idx], magnitude_total, magnitude_undefined),
                direction_pct: share(direction[idx], direction_total, direction_undefined),
                magnitude: magnitude[idx],
                direction: direction[idx],
            })
            .collect();

        rows.sort_by(|a, b| {
            b.magnitude_pct
                .total_cmp(&a.magnitude_pct)
                .then_with(|| a.feature.cmp(&b.feature))
        });

        Ok(AttributionTable {
            rows,
            base_value: 0.0,
            empty_value: None,
            weighting,
            magnitude_undefined,
            direction_undefined,
            stats: RunStats {
                n_features: features.len(),
                marginal_updates: accumulator.updates(),
                ..RunStats::default()
            },
        })
    }
}
