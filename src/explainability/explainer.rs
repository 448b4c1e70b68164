//! Exhaustive coalition enumeration driving the attribution run

use super::accumulator::AttributionAccumulator;
use super::coalition::{binomial, Coalition};
use super::matrix::FeatureMatrix;
use super::scoring::{ScoringAdapter, ScoringModel};
use super::table::{AttributionTable, Normalizer};
use crate::cache::PredictionCache;
use crate::config::AttributionConfig;
use crate::error::{AttributionError, Result};
use crate::utils::{CancellationToken, ParallelConfig, StopCondition};
use std::time::Instant;
use tracing::{debug, info, trace};

/// Global feature attribution by brute-force coalition enumeration.
///
/// For every non-empty coalition `S`, from the full set down to singletons,
/// and every feature `f ∈ S`, the marginal contribution
/// `v(S) - v(S \ {f})` is added to `f`'s magnitude (absolute) and direction
/// (signed) sums. `v` is the model's mean prediction with features outside the
/// coalition set to zero, cached so each coalition is scored exactly once.
pub struct CoalitionExplainer<'m, M: ScoringModel + ?Sized> {
    model: &'m M,
    config: AttributionConfig,
    cancel: Option<CancellationToken>,
}

impl<'m, M: ScoringModel + ?Sized> CoalitionExplainer<'m, M> {
    /// Create an explainer with the default configuration
    pub fn new(model: &'m M) -> Self {
        Self {
            model,
            config: AttributionConfig::default(),
            cancel: None,
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: AttributionConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a cancellation token checked before every model call
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn config(&self) -> &AttributionConfig {
        &self.config
    }

    /// Run the attribution over `matrix`.
    ///
    /// A matrix without features yields an empty table.
    pub fn explain(&self, matrix: &FeatureMatrix) -> Result<AttributionTable> {
        self.explain_with_cache(matrix, &PredictionCache::new())
    }

    /// Like [`explain`](Self::explain) but filling a caller-owned cache, so the
    /// evaluated coalitions can be inspected afterwards.
    ///
    /// The cache must be empty: its keys carry no model or matrix identity, so
    /// entries from another run would be read back as this run's values.
    pub fn explain_with_cache(
        &self,
        matrix: &FeatureMatrix,
        cache: &PredictionCache,
    ) -> Result<AttributionTable> {
        self.config.validate()?;

        if !cache.is_empty() {
            return Err(AttributionError::InvalidInput(format!(
                "prediction cache already holds {} coalitions; each run needs a fresh cache",
                cache.len()
            )));
        }

        let n_features = matrix.n_features();
        if n_features == 0 {
            return Ok(AttributionTable::empty(self.config.weighting));
        }
        if n_features > self.config.max_features {
            return Err(AttributionError::InvalidInput(format!(
                "{} features would need 2^{} coalition evaluations; the limit is {} features",
                n_features, n_features, self.config.max_features
            )));
        }
        if matrix.n_rows() == 0 {
            return Err(AttributionError::InvalidInput(
                "feature matrix has no rows".to_string(),
            ));
        }

        let parallel = ParallelConfig {
            n_threads: self.config.n_threads,
        };
        parallel.install(|| self.run(matrix, cache, &parallel))?
    }

    fn run(
        &self,
        matrix: &FeatureMatrix,
        cache: &PredictionCache,
        parallel: &ParallelConfig,
    ) -> Result<AttributionTable> {
        let start = Instant::now();
        let features = matrix.features();
        let n_features = features.len();
        let weighting = self.config.weighting;

        info!(
            features = n_features,
            rows = matrix.n_rows(),
            coalitions = 1u64 << n_features,
            weighting = ?weighting,
            threads = parallel.num_threads(),
            "Starting coalition attribution"
        );

        let adapter = ScoringAdapter::new(self.model, matrix);
        let stop = StopCondition::new(self.cancel.clone(), self.config.timeout());
        let before = cache.stats();

        let value_of = |coalition: Coalition| -> Result<f64> {
            cache.get_or_compute(coalition, || {
                stop.check(cache.evaluations() - before.evaluations)?;
                let value = adapter.evaluate(coalition)?;
                trace!(coalition = %features.describe(coalition), value, "Scored coalition");
                Ok(value)
            })
        };

        let full = features.full();
        let base_value = value_of(full)?;

        let mut accumulator = AttributionAccumulator::new(n_features);

        for size in (1..=n_features).rev() {
            let coalitions: Vec<Coalition> = Coalition::of_size(n_features, size).collect();
            debug_assert_eq!(coalitions.len() as u64, binomial(n_features, size));

            // Every S \ {f} lives one level down. That level is scored first with
            // one distinct key per task, so no worker blocks on an in-flight slot.
            let reduced: Vec<Coalition> = Coalition::of_size(n_features, size - 1).collect();
            parallel.try_map(&reduced, |&coalition| value_of(coalition))?;

            let contributions = parallel.try_map(&coalitions, |&coalition| {
                let base = value_of(coalition)?;
                coalition
                    .members()
                    .map(|feature| -> Result<(usize, f64)> {
                        let reduced = value_of(coalition.without(feature))?;
                        let delta = base - reduced;
                        if !delta.is_finite() {
                            return Err(AttributionError::ModelEvaluation {
                                coalition: features.describe(coalition),
                                reason: format!(
                                    "marginal contribution of '{}' overflowed ({} - {})",
                                    features.name(feature).unwrap_or_default(),
                                    base,
                                    reduced
                                ),
                            });
                        }
                        Ok((feature, delta))
                    })
                    .collect::<Result<Vec<(usize, f64)>>>()
            })?;

            // Folded in canonical coalition order so sums do not depend on scheduling
            let weight = weighting.factor(n_features, size);
            for (feature, delta) in contributions.into_iter().flatten() {
                accumulator.add(feature, weight * delta)?;
            }

            debug!(
                size,
                coalitions = coalitions.len(),
                evaluations = cache.evaluations(),
                "Processed coalition size"
            );
        }

        let mut table = Normalizer::new(self.config.decimals).normalize(
            features,
            &accumulator,
            weighting,
        )?;
        let after = cache.stats();
        let evaluations = after.evaluations - before.evaluations;
        let cache_hits = after.hits - before.hits;
        table.base_value = base_value;
        table.empty_value = cache.get(&Coalition::empty());
        table.stats.n_rows = matrix.n_rows();
        table.stats.coalitions_evaluated = evaluations;
        table.stats.cache_hits = cache_hits;
        table.stats.elapsed_ms = start.elapsed().as_millis() as u64;

        info!(
            elapsed_ms = table.stats.elapsed_ms,
            evaluations,
            cache_hits,
            updates = table.stats.marginal_updates,
            "Coalition attribution finished"
        );

        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Weighting;
    use ndarray::{array, Array1, Array2};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn matrix_abc() -> FeatureMatrix {
        let values = array![[1.0, 2.0, 3.0], [2.0, -1.0, 0.5], [3.0, 4.0, -2.0]];
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        FeatureMatrix::new(names, values).unwrap()
    }

    #[test]
    fn test_only_relevant_feature_gets_credit() {
        let model = |x: &Array2<f64>| -> Result<Array1<f64>> { Ok(x.column(0).mapv(|a| a * 2.0)) };
        let table = CoalitionExplainer::new(&model).explain(&matrix_abc()).unwrap();

        assert_eq!(table.rows[0].feature, "a");
        assert_eq!(table.get("a").unwrap().magnitude_pct, 100.0);
        assert_eq!(table.get("a").unwrap().direction_pct, 100.0);
        assert_eq!(table.get("b").unwrap().magnitude_pct, 0.0);
        assert_eq!(table.get("c").unwrap().direction_pct, 0.0);
        assert_eq!(table.base_value, 4.0);
        assert_eq!(table.empty_value, Some(0.0));
    }

    #[test]
    fn test_every_subset_scored_once() {
        let calls = AtomicUsize::new(0);
        let model = |x: &Array2<f64>| -> Result<Array1<f64>> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(x.sum_axis(ndarray::Axis(1)))
        };
        let cache = PredictionCache::new();
        let table = CoalitionExplainer::new(&model)
            .with_config(AttributionConfig::new().with_n_threads(1))
            .explain_with_cache(&matrix_abc(), &cache)
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 8);
        assert_eq!(cache.len(), 8);
        assert_eq!(table.stats.coalitions_evaluated, 8);
        // n * 2^(n-1) marginal contributions
        assert_eq!(table.stats.marginal_updates, 12);
    }

    #[test]
    fn test_empty_matrix_gives_empty_table() {
        let model = |x: &Array2<f64>| -> Result<Array1<f64>> { Ok(Array1::zeros(x.nrows())) };
        let matrix = FeatureMatrix::new(Vec::new(), Array2::zeros((4, 0))).unwrap();
        let table = CoalitionExplainer::new(&model).explain(&matrix).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_feature_limit() {
        let model = |x: &Array2<f64>| -> Result<Array1<f64>> { Ok(Array1::zeros(x.nrows())) };
        let result = CoalitionExplainer::new(&model)
            .with_config(AttributionConfig::new().with_max_features(2))
            .explain(&matrix_abc());
        assert!(matches!(result, Err(AttributionError::InvalidInput(_))));
    }

    #[test]
    fn test_no_rows_rejected() {
        let model = |x: &Array2<f64>| -> Result<Array1<f64>> { Ok(Array1::zeros(x.nrows())) };
        let names = vec!["a".to_string()];
        let matrix = FeatureMatrix::new(names, Array2::zeros((0, 1))).unwrap();
        assert!(CoalitionExplainer::new(&model).explain(&matrix).is_err());
    }

    #[test]
    fn test_cancelled_before_first_call() {
        let model = |x: &Array2<f64>| -> Result<Array1<f64>> { Ok(Array1::zeros(x.nrows())) };
        let token = CancellationToken::new();
        token.cancel();
        let err = CoalitionExplainer::new(&model)
            .with_cancellation(token)
            .explain(&matrix_abc())
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_cache_reuse_rejected() {
        let only_a = |x: &Array2<f64>| -> Result<Array1<f64>> { Ok(x.column(0).to_owned()) };
        let only_b = |x: &Array2<f64>| -> Result<Array1<f64>> { Ok(x.column(1).to_owned()) };
        let matrix = matrix_abc();
        let cache = PredictionCache::new();

        CoalitionExplainer::new(&only_a)
            .explain_with_cache(&matrix, &cache)
            .unwrap();
        let reused = CoalitionExplainer::new(&only_b).explain_with_cache(&matrix, &cache);
        assert!(matches!(reused, Err(AttributionError::InvalidInput(_))));

        let fresh = PredictionCache::new();
        let table = CoalitionExplainer::new(&only_b)
            .explain_with_cache(&matrix, &fresh)
            .unwrap();
        assert_eq!(table.rows[0].feature, "b");
        assert_eq!(table.rows[0].magnitude_pct, 100.0);
        assert_eq!(table.stats.coalitions_evaluated, 8);
    }

    #[test]
    fn test_overflowing_mean_fails_run() {
        let model = |x: &Array2<f64>| -> Result<Array1<f64>> {
            Ok(x.column(0).mapv(|a| if a != 0.0 { 1.5e308 } else { -1.5e308 }))
        };
        let values = array![[1.0, 2.0], [3.0, 4.0]];
        let matrix = FeatureMatrix::new(vec!["a".to_string(), "b".to_string()], values).unwrap();

        let err = CoalitionExplainer::new(&model).explain(&matrix).unwrap_err();
        assert!(matches!(err, AttributionError::ModelEvaluation { .. }));
    }

    #[test]
    fn test_overflowing_contribution_fails_run() {
        // One row, so every mean is finite but v({a}) - v({}) is not
        let model = |x: &Array2<f64>| -> Result<Array1<f64>> {
            Ok(x.column(0).mapv(|a| if a != 0.0 { 1.5e308 } else { -1.5e308 }))
        };
        let values = array![[1.0, 2.0]];
        let matrix = FeatureMatrix::new(vec!["a".to_string(), "b".to_string()], values).unwrap();

        let err = CoalitionExplainer::new(&model).explain(&matrix).unwrap_err();
        match err {
            AttributionError::ModelEvaluation { reason, .. } => {
                assert!(reason.contains("overflowed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_shapley_weighting_is_efficient() {
        // With Shapley weights the signed sums add up to v(full) - v(empty).
        let model = |x: &Array2<f64>| -> Result<Array1<f64>> {
            Ok(x.rows()
                .into_iter()
                .map(|r| r[0] * r[1] + 3.0 * r[2] - r[1])
                .collect())
        };
        let table = CoalitionExplainer::new(&model)
            .with_config(AttributionConfig::new().with_weighting(Weighting::Shapley))
            .explain(&matrix_abc())
            .unwrap();

        let total: f64 = table.iter().map(|r| r.direction).sum();
        let expected = table.base_value - table.empty_value.unwrap();
        assert!((total - expected).abs() < 1e-9);
    }
}
