//! # Cloudradio Common Library
//!
//! Shared types for the cloudradio control core: the wire message schema
//! spoken on both transport channels, common error types, and configuration
//! loading.

pub mod config;
pub mod error;
pub mod message;

pub use error::{Error, Result};
pub use message::{
    Message, MessageMethod, NowPlayingPayload, QueuePayloadEntry, Topic, TrackRef,
    TransportCommand,
};
