//! Feature catalogs and coalition bitmasks

use crate::config::HARD_MAX_FEATURES;
use crate::error::{AttributionError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Ordered, immutable catalog of feature names.
///
/// Position in the catalog is the feature's bit in a [`Coalition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    names: Vec<String>,
}

impl FeatureSet {
    /// Build a catalog, rejecting duplicates and catalogs wider than a bitmask
    pub fn new(names: Vec<String>) -> Result<Self> {
        if names.len() > HARD_MAX_FEATURES {
            return Err(AttributionError::InvalidInput(format!(
                "{} features exceed the supported maximum of {}",
                names.len(),
                HARD_MAX_FEATURES
            )));
        }
        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(AttributionError::InvalidInput(format!(
                    "duplicate feature name '{}'",
                    name
                )));
            }
        }
        Ok(Self { names })
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog has no features
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Feature names in catalog order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Name of the feature at `index`
    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Position of the feature called `name`
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// The coalition holding every feature
    pub fn full(&self) -> Coalition {
        Coalition::full(self.len())
    }

    /// Build a coalition from feature names
    pub fn coalition_of<S: AsRef<str>>(&self, names: &[S]) -> Result<Coalition> {
        let mut coalition = Coalition::empty();
        for name in names {
            let name = name.as_ref();
            let idx = self.index_of(name).ok_or_else(|| {
                AttributionError::InvalidInput(format!("unknown feature '{}'", name))
            })?;
            coalition = coalition.with(idx);
        }
        Ok(coalition)
    }

    /// Human-readable member list, e.g. `{age, income}`
    pub fn describe(&self, coalition: Coalition) -> String {
        let members: Vec<&str> = coalition
            .members()
            .filter_map(|idx| self.name(idx))
            .collect();
        format!("{{{}}}", members.join(", "))
    }
}

/// A subset of a [`FeatureSet`], stored as a bitmask over feature positions.
///
/// Equal subsets compare and hash equal no matter how they were built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Coalition(u64);

impl Coalition {
    /// The coalition with no features
    pub const fn empty() -> Self {
        Coalition(0)
    }

    /// The coalition holding features `0..n_features`
    pub fn full(n_features: usize) -> Self {
        debug_assert!(n_features <= HARD_MAX_FEATURES);
        Coalition((1u64 << n_features) - 1)
    }

    /// Wrap a raw bitmask
    pub const fn from_bits(bits: u64) -> Self {
        Coalition(bits)
    }

    /// The raw bitmask
    pub const fn bits(self) -> u64 {
        self.0
    }

    /// Number of features in the coalition
    pub fn size(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Whether feature `index` is a member
    pub fn contains(self, index: usize) -> bool {
        index < 64 && self.0 & (1u64 << index) != 0
    }

    /// This coalition plus feature `index`
    pub fn with(self, index: usize) -> Self {
        Coalition(self.0 | (1u64 << index))
    }

    /// This coalition minus feature `index`
    pub fn without(self, index: usize) -> Self {
        Coalition(self.0 & !(1u64 << index))
    }

    /// Member positions in ascending order
    pub fn members(self) -> Members {
        Members { remaining: self.0 }
    }

    /// Every coalition of exactly `size` features drawn from `n_features`
    pub fn of_size(n_features: usize, size: usize) -> Combinations {
        Combinations::new(n_features, size)
    }
}

impl fmt::Display for Coalition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let members: Vec<String> = self.members().map(|m| m.to_string()).collect();
        write!(f, "{{{}}}", members.join(", "))
    }
}

/// Iterator over the member positions of a coalition
#[derive(Debug, Clone)]
pub struct Members {
    remaining: u64,
}

impl Iterator for Members {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.remaining == 0 {
            return None;
        }
        let idx = self.remaining.trailing_zeros() as usize;
        self.remaining &= self.remaining - 1;
        Some(idx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Members {}

/// Iterator over all `C(n, k)` coalitions of size `k`, in ascending bitmask order.
///
/// Uses Gosper's hack to step to the next mask with the same popcount.
#[derive(Debug, Clone)]
pub struct Combinations {
    next: Option<u64>,
    limit: u64,
}

impl Combinations {
    fn new(n_features: usize, size: usize) -> Self {
        debug_assert!(n_features <= HARD_MAX_FEATURES);
        let limit = 1u64 << n_features;
        let next = if size > n_features {
            None
        } else if size == 0 {
            Some(0)
        } else {
            Some((1u64 << size) - 1)
        };
        Self { next, limit }
    }
}

impl Iterator for Combinations {
    type Item = Coalition;

    fn next(&mut self) -> Option<Coalition> {
        let current = self.next?;
        self.next = if current == 0 {
            None
        } else {
            let lowest = current & current.wrapping_neg();
            let ripple = current + lowest;
            let candidate = (((ripple ^ current) >> 2) / lowest) | ripple;
            (candidate < self.limit).then_some(candidate)
        };
        Some(Coalition(current))
    }
}

/// Binomial coefficient `C(n, k)` as an exact integer
pub fn binomial(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut result: u128 = 1;
    for i in 0..k {
        // result * (n - i) is always divisible by (i + 1) at this point
        result = result * (n - i) as u128 / (i + 1) as u128;
    }
    result as u64
}
