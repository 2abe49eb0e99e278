//! Error types for entigram.

use thiserror::Error;

/// Result type alias using entigram's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for entigram operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Category not found in the index
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Reference to an entity with no row evidence
    #[error("Invalid entity: {0}")]
    InvalidEntity(String),

    /// Commit attempted with no candidate entities selected
    #[error("Empty selection: a category cannot be committed without entities")]
    EmptySelection,

    /// Extraction collaborator failed or timed out
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Dataset loading or parsing failed
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
