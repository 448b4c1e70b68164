//! Compute-once prediction cache keyed by coalition
//!
//! Thread-safe memoization with no eviction: every distinct coalition is
//! evaluated at most once for the lifetime of the cache, even when several
//! workers ask for it at the same moment.

use crate::error::Result;
use crate::explainability::Coalition;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One cache slot. The slot lock is held while its value is computed, so
/// concurrent callers for the same key wait instead of recomputing.
type Slot = Arc<Mutex<Option<f64>>>;

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Published entries
    pub entries: usize,
    /// Times the compute closure ran to completion
    pub evaluations: usize,
    /// Lookups answered from a published entry
    pub hits: usize,
}

/// Memoizes `Coalition -> mean prediction`
#[derive(Debug, Default)]
pub struct PredictionCache {
    slots: Mutex<HashMap<Coalition, Slot>>,
    evaluations: AtomicUsize,
    hits: AtomicUsize,
}

impl PredictionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache sized for `capacity` coalitions
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Mutex::new(HashMap::with_capacity(capacity)),
            ..Self::default()
        }
    }

    /// Return the cached value for `key`, computing it with `compute` on the
    /// first request.
    ///
    /// A failed computation publishes nothing and its error is returned to
    /// the caller that ran it.
    pub fn get_or_compute<F>(&self, key: Coalition, compute: F) -> Result<f64>
    where
        F: FnOnce() -> Result<f64>,
    {
        let slot = {
            let mut slots = self.slots.lock();
            Arc::clone(slots.entry(key).or_default())
        };

        let mut value = slot.lock();
        if let Some(v) = *value {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(v);
        }

        let computed = compute()?;
        *value = Some(computed);
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        Ok(computed)
    }

    /// Published value for `key`, if any
    pub fn get(&self, key: &Coalition) -> Option<f64> {
        let slot = self.slots.lock().get(key).cloned()?;
        let value = *slot.lock();
        value
    }

    /// Whether `key` has a published value
    pub fn contains(&self, key: &Coalition) -> bool {
        self.get(key).is_some()
    }

    /// Number of published entries
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.lock().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of completed computations so far
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Current counters
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            evaluations: self.evaluations(),
            hits: self.hits.load(Ordering::Relaxed),
        }
    }
}
