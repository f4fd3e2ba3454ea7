//! Error types for I/O operations

use proxymesh_core::Error;
use thiserror::Error;

/// Errors raised while decoding or encoding files
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },

    #[error("Parse error in {location}: {message}")]
    ParseError { location: String, message: String },

    #[error("Missing property: {name}")]
    MissingProperty { name: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IoError {
    pub(crate) fn parse(location: impl Into<String>, message: impl Into<String>) -> Self {
        IoError::ParseError {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Io(e) => Error::Io(e),
            IoError::InvalidFormat { format } => Error::UnsupportedFormat(format),
            other => Error::Format(other.to_string()),
        }
    }
}
