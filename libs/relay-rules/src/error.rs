//! Rule Store Error Types

use thiserror::Error;

/// Result type for rule store operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Rule store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Insert targeting an identifier that already exists
    #[error("Rule already exists: {0}")]
    DuplicateKey(String),

    /// Update targeting an unknown identifier
    #[error("Rule not found: {0}")]
    NotFound(String),

    /// Search on a field name the store does not index
    #[error("Unsupported query field: {0}")]
    InvalidQuery(String),

    /// Structurally unusable rule input
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Underlying engine or I/O failure; the enclosing transaction was rolled back
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON encode/decode failure
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Flat-file import failure; rows before `row` remain committed
    #[error("Import failed at row {row}: {reason}")]
    Import { row: usize, reason: String },

    /// CSV reader/writer failure outside a specific data row
    #[error("CSV error: {0}")]
    Csv(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for StoreError {
    fn from(err: csv::Error) -> Self {
        StoreError::Csv(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Storage(err.to_string())
    }
}
