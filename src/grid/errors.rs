//! Grid-synthesis error types

use thiserror::Error;

/// Errors that can occur while deriving grid configurations from price history
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Price history is empty")]
    EmptyHistory,

    #[error("Insufficient price history: need at least {required} bars, got {got}")]
    InsufficientHistory { required: usize, got: usize },
}

/// Result type for grid synthesis
pub type GridResult<T> = std::result::Result<T, GridError>;
