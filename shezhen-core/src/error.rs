//! Error types for the shezhen core library.

use thiserror::Error;

/// Why a user-supplied file was refused before any network activity.
#[derive(Debug, Error)]
pub enum InvalidInput {
    /// The declared content type does not describe an image.
    #[error("Declared content type is not an image: '{0}'")]
    NotAnImage(String),

    /// No content type was declared, or it was too vague to use (`image/*`).
    #[error("Content type is missing or ambiguous")]
    MissingMediaType,

    /// The file had no bytes.
    #[error("Image file is empty")]
    Empty,

    /// The payload claimed to be base64 but was not.
    #[error("Invalid image encoding: {0}")]
    InvalidEncoding(String),

    /// The file could not be read.
    #[error("Failed to read image file: {0}")]
    Unreadable(#[from] std::io::Error),
}

/// Top-level error type for core operations.
#[derive(Error, Debug)]
pub enum ShezhenError {
    /// A user-supplied image was rejected.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, ShezhenError>;
