//! Cooperative cancellation for long attribution runs

use crate::error::{AttributionError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared cancellation flag.
///
/// Clones observe the same flag, so one handle can be given to the run and
/// another kept by the caller (or a signal handler).
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Deadline and token checked between model evaluations
#[derive(Debug, Clone)]
pub(crate) struct StopCondition {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl StopCondition {
    pub(crate) fn new(token: Option<CancellationToken>, timeout: Option<Duration>) -> Self {
        Self {
            token,
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    /// Fail with `Cancelled` if the token fired or the deadline passed
    pub(crate) fn check(&self, evaluations: usize) -> Result<()> {
        if self.token.as_ref().is_some_and(|t| t.is_cancelled()) {
            return Err(AttributionError::Cancelled {
                reason: "cancellation requested".to_string(),
                evaluations,
            });
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(AttributionError::Cancelled {
                reason: "deadline exceeded".to_string(),
                evaluations,
            });
        }
        Ok(())
    }
}
