//! Error types for coalition attribution

use thiserror::Error;

/// Result type alias for attribution operations
pub type Result<T> = std::result::Result<T, AttributionError>;

/// Main error type for attribution runs
#[derive(Error, Debug)]
pub enum AttributionError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Model evaluation failed for coalition {coalition}: {reason}")]
    ModelEvaluation { coalition: String, reason: String },

    #[error("Attribution cancelled ({reason}) after {evaluations} model evaluations")]
    Cancelled { reason: String, evaluations: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Data error: {0}")]
    DataError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),
}

impl AttributionError {
    /// Whether the run stopped because it was asked to, rather than failing
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AttributionError::Cancelled { .. })
    }
}

impl From<polars::error::PolarsError> for AttributionError {
    fn from(err: polars::error::PolarsError) -> Self {
        AttributionError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for AttributionError {
    fn from(err: serde_json::Error) -> Self {
        AttributionError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for AttributionError {
    fn from(err: ndarray::ShapeError) -> Self {
        AttributionError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
