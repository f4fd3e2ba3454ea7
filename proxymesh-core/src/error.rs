//! Error types for proxymesh

use thiserror::Error;

/// Main error type for proxymesh operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Malformed file: {0}")]
    Format(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for proxymesh operations
pub type Result<T> = std::result::Result<T, Error>;
