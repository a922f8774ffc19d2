//! Common error types for cloudradio

use thiserror::Error;

/// Common result type for cloudradio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across cloudradio crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Inbound message could not be decoded
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
