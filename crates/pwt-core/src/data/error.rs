//! Error types for data operations

use std::fmt;

/// Result type for data operations
pub type DataResult<T> = Result<T, DataError>;

/// Errors that can occur during data operations
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    /// Arrow error (from arrow-rs)
    Arrow(String),
    /// Column not found in DataFrame
    ColumnNotFound(String),
    /// Column name already present in DataFrame
    DuplicateColumn(String),
    /// Type mismatch during operation
    TypeMismatch { expected: String, found: String },
    /// Row count of a new column differs from the DataFrame
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
    /// I/O error (file read/write)
    Io(String),
    /// CSV error
    Csv(String),
    /// Removing every column of a DataFrame
    EmptyData,
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Arrow(msg) => write!(f, "Arrow error: {msg}"),
            DataError::ColumnNotFound(name) => write!(f, "column not found: {name}"),
            DataError::DuplicateColumn(name) => write!(f, "column already exists: {name}"),
            DataError::TypeMismatch { expected, found } => {
                write!(f, "type mismatch: expected {expected}, found {found}")
            }
            DataError::LengthMismatch {
                column,
                expected,
                found,
            } => write!(
                f,
                "column '{column}' has {found} rows, expected {expected}"
            ),
            DataError::Io(msg) => write!(f, "I/O error: {msg}"),
            DataError::Csv(msg) => write!(f, "CSV error: {msg}"),
            DataError::EmptyData => write!(f, "empty DataFrame"),
        }
    }
}

impl std::error::Error for DataError {}

impl From<arrow::error::ArrowError> for DataError {
    fn from(err: arrow::error::ArrowError) -> Self {
        DataError::Arrow(err.to_string())
    }
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::Io(err.to_string())
    }
}
