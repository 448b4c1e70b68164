//! Scoring models and the coalition scoring adapter

use super::coalition::Coalition;
use super::matrix::FeatureMatrix;
use crate::error::{AttributionError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A trained model seen as a pure function from rows to predictions.
///
/// Implementations must be deterministic: the same rows always give the same
/// predictions. Attribution caches one prediction per coalition and relies on
/// this to stay correct.
pub trait ScoringModel: Sync {
    /// One prediction per input row
    fn score(&self, rows: &Array2<f64>) -> Result<Array1<f64>>;
}

impl<F> ScoringModel for F
where
    F: Fn(&Array2<f64>) -> Result<Array1<f64>> + Sync,
{
    fn score(&self, rows: &Array2<f64>) -> Result<Array1<f64>> {
        self(rows)
    }
}

/// Linear model: `intercept + Σ coefficient_j · x_j`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearScorer {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LinearScorer {
    /// Coefficients in feature order
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    /// Coefficients given by feature name; unnamed features get zero
    pub fn from_named(
        feature_names: &[String],
        named: &[(String, f64)],
        intercept: f64,
    ) -> Result<Self> {
        let mut coefficients = vec![0.0; feature_names.len()];
        for (name, value) in named {
            let idx = feature_names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| {
                    AttributionError::InvalidInput(format!(
                        "coefficient given for unknown feature '{}'",
                        name
                    ))
                })?;
            coefficients[idx] = *value;
        }
        Ok(Self::new(coefficients, intercept))
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl ScoringModel for LinearScorer {
    fn score(&self, rows: &Array2<f64>) -> Result<Array1<f64>> {
        if rows.ncols() != self.coefficients.len() {
            return Err(AttributionError::ShapeError {
                expected: format!("{} columns", self.coefficients.len()),
                actual: format!("{} columns", rows.ncols()),
            });
        }
        let weights = Array1::from_vec(self.coefficients.clone());
        Ok(rows.dot(&weights) + self.intercept)
    }
}

/// Turns a coalition into a scalar: mask absent features to zero, score every
/// row, return the mean prediction.
pub struct ScoringAdapter<'a, M: ScoringModel + ?Sized> {
    model: &'a M,
    matrix: &'a FeatureMatrix,
}

impl<'a, M: ScoringModel + ?Sized> ScoringAdapter<'a, M> {
    pub fn new(model: &'a M, matrix: &'a FeatureMatrix) -> Self {
        Self { model, matrix }
    }

    /// Mean prediction with only the features in `coalition` present.
    ///
    /// Model errors, a wrong prediction count, non-finite predictions and a
    /// mean that overflows all surface as `ModelEvaluation` naming the coalition.
    pub fn evaluate(&self, coalition: Coalition) -> Result<f64> {
        let rows = self.matrix.masked(coalition);
        let n_rows = rows.nrows();

        let predictions = self
            .model
            .score(&rows)
            .map_err(|e| self.failure(coalition, e.to_string()))?;

        if predictions.len() != n_rows {
            return Err(self.failure(
                coalition,
                format!("expected {} predictions, got {}", n_rows, predictions.len()),
            ));
        }
        if let Some(pos) = predictions.iter().position(|p| !p.is_finite()) {
            return Err(self.failure(
                coalition,
                format!("non-finite prediction {} at row {}", predictions[pos], pos),
            ));
        }

        let mean = predictions
            .mean()
            .ok_or_else(|| self.failure(coalition, "no rows to score".to_string()))?;
        // Finite predictions can still overflow when summed
        if !mean.is_finite() {
            return Err(self.failure(
                coalition,
                format!("non-finite mean prediction {} over {} rows", mean, n_rows),
            ));
        }
        Ok(mean)
    }

    fn failure(&self, coalition: Coalition, reason: String) -> AttributionError {
        AttributionError::ModelEvaluation {
            coalition: self.matrix.features().describe(coalition),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn matrix() -> FeatureMatrix {
        let values = array![[1.0, 10.0], [3.0, 20.0]];
        FeatureMatrix::new(vec!["a".to_string(), "b".to_string()], values).unwrap()
    }

    #[test]
    fn test_closure_is_a_model() {
        let model = |x: &Array2<f64>| -> Result<Array1<f64>> { Ok(x.column(0).to_owned()) };
        let m = matrix();
        let adapter = ScoringAdapter::new(&model, &m);
        assert_eq!(adapter.evaluate(Coalition::full(2)).unwrap(), 2.0);
        assert_eq!(adapter.evaluate(Coalition::from_bits(0b10)).unwrap(), 0.0);
    }

    #[test]
    fn test_linear_scorer() {
        let model = LinearScorer::new(vec![2.0, 0.5], 1.0);
        let m = matrix();
        let adapter = ScoringAdapter::new(&model, &m);

        // rows: 1 + 2*1 + 0.5*10 = 8, 1 + 2*3 + 0.5*20 = 17
        assert_eq!(adapter.evaluate(Coalition::full(2)).unwrap(), 12.5);
        // only the intercept survives
        assert_eq!(adapter.evaluate(Coalition::empty()).unwrap(), 1.0);
    }

    #[test]
    fn test_linear_scorer_from_named() {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let model = LinearScorer::from_named(&names, &[("c".to_string(), 3.0)], 0.0).unwrap();
        assert_eq!(model.coefficients(), &[0.0, 0.0, 3.0]);

        let unknown = LinearScorer::from_named(&names, &[("z".to_string(), 1.0)], 0.0);
        assert!(unknown.is_err());
    }

    #[test]
    fn test_wrong_prediction_count() {
        let model = |_: &Array2<f64>| -> Result<Array1<f64>> { Ok(array![1.0]) };
        let m = matrix();
        let err = ScoringAdapter::new(&model, &m)
            .evaluate(Coalition::from_bits(0b01))
            .unwrap_err();
        match err {
            AttributionError::ModelEvaluation { coalition, reason } => {
                assert_eq!(coalition, "{a}");
                assert!(reason.contains("expected 2 predictions"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_finite_prediction() {
        let model = |x: &Array2<f64>| -> Result<Array1<f64>> {
            Ok(Array1::from_elem(x.nrows(), f64::NAN))
        };
        let m = matrix();
        let result = ScoringAdapter::new(&model, &m).evaluate(Coalition::full(2));
        assert!(matches!(result, Err(AttributionError::ModelEvaluation { .. })));
    }

    #[test]
    fn test_overflowing_mean_is_rejected() {
        // Each prediction is finite but their sum is not
        let model = |x: &Array2<f64>| -> Result<Array1<f64>> {
            Ok(x.column(0)
                .mapv(|a| if a != 0.0 { 1.5e308 } else { -1.5e308 }))
        };
        let m = matrix();
        let err = ScoringAdapter::new(&model, &m)
            .evaluate(Coalition::full(2))
            .unwrap_err();
        match err {
            AttributionError::ModelEvaluation { coalition, reason } => {
                assert_eq!(coalition, "{a, b}");
                assert!(reason.contains("non-finite mean"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_model_error_is_wrapped() {
        let model = |_: &Array2<f64>| -> Result<Array1<f64>> {
            Err(AttributionError::DataError("model exploded".to_string()))
        };
        let m = matrix();
        let err = ScoringAdapter::new(&model, &m)
            .evaluate(Coalition::empty())
            .unwrap_err();
        assert!(err.to_string().contains("model exploded"));
        assert!(err.to_string().contains("{}"));
    }
}
