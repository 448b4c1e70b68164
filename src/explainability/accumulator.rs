//! Running per-feature magnitude and direction sums

use crate::error::{AttributionError, Result};

/// Per-feature accumulators, all starting at zero.
///
/// `magnitude` sums `|Δ|` and never decreases; `direction` sums `Δ`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributionAccumulator {
    magnitude: Vec<f64>,
    direction: Vec<f64>,
    updates: usize,
}

impl AttributionAccumulator {
    pub fn new(n_features: usize) -> Self {
        Self {
            magnitude: vec![0.0; n_features],
            direction: vec![0.0; n_features],
            updates: 0,
        }
    }

    /// Record marginal contribution `delta` for feature `feature`
    pub fn add(&mut self, feature: usize, delta: f64) -> Result<()> {
        if feature >= self.magnitude.len() {
            return Err(AttributionError::InvalidInput(format!(
                "feature index {} out of range for {} features",
                feature,
                self.magnitude.len()
            )));
        }
        self.magnitude[feature] += delta.abs();
        self.direction[feature] += delta;
        self.updates += 1;
        Ok(())
    }

    pub fn magnitude(&self) -> &[f64] {
        &self.magnitude
    }

    pub fn direction(&self) -> &[f64] {
        &self.direction
    }

    /// Number of `add` calls applied
    pub fn updates(&self) -> usize {
        self.updates
    }

    pub fn n_features(&self) -> usize {
        self.magnitude.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_tracks_abs_and_signed() {
        let mut acc = AttributionAccumulator::new(2);
        acc.add(0, 1.5).unwrap();
        acc.add(0, -2.0).unwrap();
        acc.add(1, 0.25).unwrap();

        assert_eq!(acc.magnitude(), &[3.5, 0.25]);
        assert_eq!(acc.direction(), &[-0.5, 0.25]);
        assert_eq!(acc.updates(), 3);
    }

    #[test]
    fn test_order_does_not_matter() {
        let deltas = [(0, 1.0), (1, -3.0), (0, 2.0), (1, 0.5)];
        let mut forward = AttributionAccumulator::new(2);
        let mut backward = AttributionAccumulator::new(2);
        for &(f, d) in deltas.iter() {
            forward.add(f, d).unwrap();
        }
        for &(f, d) in deltas.iter().rev() {
            backward.add(f, d).unwrap();
        }
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_unknown_feature() {
        let mut acc = AttributionAccumulator::new(1);
        assert!(acc.add(1, 1.0).is_err());
        assert_eq!(acc.updates(), 0);
    }
}
