//! Error types for the energy_forecast crate

use thiserror::Error;

/// Custom error types for the energy_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Fewer rows available than a required window
    #[error("Insufficient data: need at least {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Target column not numeric-coercible, or empty after coercion
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// No trained model persisted for a backend
    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    /// Unknown backend identifier, imputation method, or similar
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    /// Error related to parameter validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error related to data handling or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from artifact storage operations
    #[error("Artifact error: {0}")]
    ArtifactError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from artifact (de)serialization
    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<polars::prelude::PolarsError> for ForecastError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}
