//! Read-only feature matrix consumed by the scoring adapter

use super::coalition::{Coalition, FeatureSet};
use crate::error::{AttributionError, Result};
use ndarray::Array2;
use polars::prelude::*;

/// Numeric feature table: rows × features, plus the feature catalog.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    features: FeatureSet,
    values: Array2<f64>,
}

impl FeatureMatrix {
    /// Build from feature names and a row-major value array
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if names.len() != values.ncols() {
            return Err(AttributionError::ShapeError {
                expected: format!("{} columns", names.len()),
                actual: format!("{} columns", values.ncols()),
            });
        }
        let features = FeatureSet::new(names)?;
        Ok(Self { features, values })
    }

    /// Build from a DataFrame, dropping `target` and keeping every other column
    /// in frame order.
    ///
    /// Every feature column must cast to `Float64` without producing nulls.
    pub fn from_dataframe(df: &DataFrame, target: &str) -> Result<Self> {
        let column_names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect();

        if !column_names.iter().any(|name| name == target) {
            return Err(AttributionError::InvalidInput(format!(
                "target column '{}' not found",
                target
            )));
        }

        let feature_cols: Vec<String> = column_names
            .into_iter()
            .filter(|name| name != target)
            .collect();

        let n_rows = df.height();
        let col_data: Vec<Vec<f64>> = feature_cols
            .iter()
            .map(|col_name| {
                let column = df.column(col_name)?;
                let column_f64 = column.cast(&DataType::Float64).map_err(|e| {
                    AttributionError::InvalidInput(format!(
                        "feature column '{}' is not numeric: {}",
                        col_name, e
                    ))
                })?;
                let nulls = column_f64.null_count();
                if nulls > 0 {
                    return Err(AttributionError::InvalidInput(format!(
                        "feature column '{}' has {} null or non-numeric values",
                        col_name, nulls
                    )));
                }
                let values: Vec<f64> = column_f64
                    .f64()?
                    .into_iter()
                    .map(|v| v.unwrap_or(0.0))
                    .collect();
                Ok(values)
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
        let values = Array2::from_shape_fn((n_rows, col_refs.len()), |(r, c)| col_refs[c][r]);

        Self::new(feature_cols, values)
    }

    /// The feature catalog
    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    /// Raw values, rows × features
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Copy of the values with every feature outside `coalition` set to zero
    pub fn masked(&self, coalition: Coalition) -> Array2<f64> {
        let mut masked = self.values.clone();
        for (idx, mut column) in masked.columns_mut().into_iter().enumerate() {
            if !coalition.contains(idx) {
                column.fill(0.0);
            }
        }
        masked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_dataframe_drops_target() {
        let df = df!(
            "a" => &[1.0, 2.0, 3.0],
            "target" => &[0.0, 1.0, 0.0],
            "b" => &[4i32, 5, 6]
        )
        .unwrap();

        let matrix = FeatureMatrix::from_dataframe(&df, "target").unwrap();
        assert_eq!(matrix.features().names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.values()[[1, 1]], 5.0);
    }

    #[test]
    fn test_missing_target() {
        let df = df!("a" => &[1.0, 2.0]).unwrap();
        let result = FeatureMatrix::from_dataframe(&df, "y");
        assert!(matches!(result, Err(AttributionError::InvalidInput(_))));
    }

    #[test]
    fn test_non_numeric_feature_rejected() {
        let df = df!(
            "a" => &["x", "y"],
            "target" => &[1.0, 2.0]
        )
        .unwrap();
        let result = FeatureMatrix::from_dataframe(&df, "target");
        assert!(matches!(result, Err(AttributionError::InvalidInput(_))));
    }

    #[test]
    fn test_null_feature_rejected() {
        let df = df!(
            "a" => &[Some(1.0), None],
            "target" => &[1.0, 2.0]
        )
        .unwrap();
        assert!(FeatureMatrix::from_dataframe(&df, "target").is_err());
    }

    #[test]
    fn test_new_checks_shape() {
        let values = array![[1.0, 2.0], [3.0, 4.0]];
        let result = FeatureMatrix::new(vec!["a".to_string()], values);
        assert!(matches!(result, Err(AttributionError::ShapeError { .. })));
    }

    #[test]
    fn test_masked_zeroes_absent_features() {
        let values = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let matrix = FeatureMatrix::new(names, values).unwrap();

        let masked = matrix.masked(Coalition::from_bits(0b010));
        assert_eq!(masked, array![[0.0, 2.0, 0.0], [0.0, 5.0, 0.0]]);
        // Source is untouched
        assert_eq!(matrix.values()[[0, 0]], 1.0);
    }
}
