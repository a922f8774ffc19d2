//! Error types for cloudradio-player
//!
//! Defines module-specific error types using thiserror for clear error
//! propagation. Navigational failures (no current/playing/next/previous
//! item) are ordinary rejected outcomes, logged and recovered by the
//! controller, never faults that unwind the process.

use thiserror::Error;

/// Main error type for the cloudradio-player crate
#[derive(Error, Debug)]
pub enum Error {
    /// Play requested but the queue has no current item
    #[error("no current item in queue")]
    NoCurrentItem,

    /// Pause requested but no item is playing
    #[error("no playing item in queue")]
    NoPlayingItem,

    /// Navigation past the end of the queue
    #[error("no next item in queue")]
    NoNextItem,

    /// Navigation before the start of the queue
    #[error("no previous item in queue")]
    NoPreviousItem,

    /// Inbound payload did not match the topic's expected shape
    #[error("malformed {topic} payload: {reason}")]
    MalformedPayload {
        topic: &'static str,
        reason: String,
    },

    /// Unrecognized transport control verb; ignored without effect
    #[error("unrecognized player state command: {0:?}")]
    UnknownCommand(String),

    /// Remote channel failure (connect, encode, send)
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration errors surfaced from cloudradio-common
    #[error("configuration error: {0}")]
    Config(#[from] cloudradio_common::Error),
}

/// Convenience Result type using the cloudradio-player Error
pub type Result<T> = std::result::Result<T, Error>;
