//! Error types for the scoring pipeline.

use thiserror::Error;

/// Result type alias using `RiskError`.
pub type Result<T> = std::result::Result<T, RiskError>;

/// Errors that abort a scoring run. A run either completes or fails outright.
#[derive(Debug, Error)]
pub enum RiskError {
    /// An expected input column is absent from the table header.
    #[error("missing required column: {0}")]
    MissingRequiredColumn(String),

    /// A timestamp cell could not be parsed.
    #[error("malformed timestamp at row {row}: {value:?}")]
    MalformedTimestamp {
        /// Zero-based data row index.
        row: usize,
        /// Offending cell content.
        value: String,
    },

    /// A numeric cell could not be parsed.
    #[error("malformed value in column {column} at row {row}: {value:?}")]
    MalformedValue {
        row: usize,
        column: String,
        value: String,
    },

    /// No event matched the relevant event types.
    #[error("no events match the relevant event types")]
    EmptyFilteredSet,

    /// A `Required` feature column has no value for an account after the join.
    #[error("feature {column} missing for account {account}")]
    MissingFeature { account: String, column: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Scoring was requested before the detector was fitted.
    #[error("anomaly detector is not fitted")]
    ModelNotFitted,

    /// Scored matrix width differs from the fitted width.
    #[error("feature dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// NaN or infinity in the feature matrix handed to the detector.
    #[error("non-finite feature at row {row}, column {col}")]
    NonFiniteFeature { row: usize, col: usize },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
