//! Error types for the view layer

use pwt_core::{DataError, UnknownLabelError};
use thiserror::Error;

/// View-related errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ViewError {
    /// The filters matched no rows
    #[error("no data for the selected filters")]
    EmptySelection,

    /// The table has no numeric column to plot
    #[error("no numeric variables available for plotting")]
    NoVariables,

    /// A selected label did not resolve to a column
    #[error(transparent)]
    UnknownLabel(#[from] UnknownLabelError),

    /// Table access failed
    #[error("data error: {0}")]
    Data(#[from] DataError),

    /// Writing an export failed
    #[error("failed to write export: {0}")]
    Io(String),
}

impl From<std::io::Error> for ViewError {
    fn from(err: std::io::Error) -> Self {
        ViewError::Io(err.to_string())
    }
}

/// Result type alias for view operations
pub type ViewResult<T> = Result<T, ViewError>;
