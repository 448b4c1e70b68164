//! Parallel processing utilities

use crate::error::{AttributionError, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for parallel processing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// Number of threads (None = use the global rayon pool)
    pub n_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set number of threads
    pub fn with_threads(mut self, n: usize) -> Self {
        self.n_threads = Some(n);
        self
    }

    /// Get the number of threads to use
    pub fn num_threads(&self) -> usize {
        self.n_threads.unwrap_or_else(rayon::current_num_threads)
    }

    /// Whether work should run on the calling thread only
    pub fn is_sequential(&self) -> bool {
        self.num_threads() <= 1
    }

    /// Run `f` inside the thread pool this configuration describes.
    ///
    /// `None` reuses the global pool, an explicit count builds a dedicated one.
    pub fn install<T, F>(&self, f: F) -> Result<T>
    where
        T: Send,
        F: FnOnce() -> T + Send,
    {
        match self.n_threads {
            None | Some(1) => Ok(f()),
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| AttributionError::ThreadPoolError(e.to_string()))?;
                Ok(pool.install(f))
            }
        }
    }

    /// Map `f` over `items`, preserving input order, stopping at the first error.
    pub fn try_map<T, U, F>(&self, items: &[T], f: F) -> Result<Vec<U>>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> Result<U> + Send + Sync,
    {
        if self.is_sequential() {
            items.iter().map(f).collect()
        } else {
            items.par_iter().map(f).collect()
        }
    }
}
