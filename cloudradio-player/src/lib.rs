//! # Cloudradio Player (cloudradio-player)
//!
//! Control core of the networked cloudradio media player.
//!
//! **Purpose:** Maintain the ordered playback queue and per-item lifecycle,
//! mix content and ambient "noise" volume levels, and synchronize playback
//! commands and state across two transport channels (in-process and remote
//! socket).
//!
//! **Architecture:** A single-dispatch controller loop owns all mutable
//! state; both channels feed it through one command queue, so handler
//! execution is never interleaved.

pub mod backend;
pub mod bus;
pub mod controller;
pub mod error;
pub mod mixer;
pub mod queue;

pub use controller::PlayerController;
pub use error::{Error, Result};
