//! Wire message schema shared by both transport channels.
//!
//! Every message on either channel (in-process or remote socket) has the
//! same shape on the wire:
//!
//! ```json
//! { "topic": "playerState", "method": "PUT", "payload": "NEXT" }
//! ```
//!
//! Topics and methods are closed enumerations so that dispatch is matched
//! exhaustively at compile time; an unrecognized topic string fails
//! deserialization and is dropped (with a logged diagnostic) at the
//! transport edge.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Verb qualifying a message's intent.
///
/// Only `PUT` is exercised by the playback controller; `GET` and `DELETE`
/// are part of the channel contract and may be used by other surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageMethod {
    Get,
    Put,
    Delete,
}

impl std::fmt::Display for MessageMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageMethod::Get => write!(f, "GET"),
            MessageMethod::Put => write!(f, "PUT"),
            MessageMethod::Delete => write!(f, "DELETE"),
        }
    }
}

/// Logical channel name used to route a message to interested handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Topic {
    /// Full queue replacement payload (inbound)
    #[serde(rename = "queue")]
    Queue,

    /// Transport control verb: PLAY / PAUSE / NEXT / PREVIOUS (inbound)
    #[serde(rename = "playerState")]
    PlayerState,

    /// Master volume, 0-100 (inbound)
    #[serde(rename = "volume")]
    Volume,

    /// Noise fraction, 0-100 (inbound)
    #[serde(rename = "noise")]
    Noise,

    /// Now-playing announcement (outbound, remote channel only)
    #[serde(rename = "queue_item")]
    QueueItem,
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Topic::Queue => write!(f, "queue"),
            Topic::PlayerState => write!(f, "playerState"),
            Topic::Volume => write!(f, "volume"),
            Topic::Noise => write!(f, "noise"),
            Topic::QueueItem => write!(f, "queue_item"),
        }
    }
}

/// Envelope for every message on either channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub topic: Topic,
    pub method: MessageMethod,
    pub payload: Value,
}

impl Message {
    pub fn new(topic: Topic, method: MessageMethod, payload: Value) -> Self {
        Self {
            topic,
            method,
            payload,
        }
    }
}

/// Opaque reference to a playable resource hosted by an external provider.
///
/// Immutable once created; the control core never interprets the id beyond
/// relaying it back out in now-playing announcements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackRef {
    pub id: u64,

    #[serde(rename = "providerId")]
    pub provider_id: String,
}

impl TrackRef {
    pub fn new(id: u64, provider_id: impl Into<String>) -> Self {
        Self {
            id,
            provider_id: provider_id.into(),
        }
    }
}

impl std::fmt::Display for TrackRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider_id, self.id)
    }
}

/// One entry of an inbound `queue` PUT payload.
///
/// The server-side payload historically used `provider` for the provider
/// id, so that spelling is accepted as an alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuePayloadEntry {
    pub track: QueueTrackPayload,
}

/// Track reference as it appears in a `queue` payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueTrackPayload {
    pub id: u64,

    #[serde(rename = "providerId", alias = "provider")]
    pub provider_id: String,
}

impl From<QueueTrackPayload> for TrackRef {
    fn from(payload: QueueTrackPayload) -> Self {
        TrackRef {
            id: payload.id,
            provider_id: payload.provider_id,
        }
    }
}

/// Outbound `queue_item` announcement payload: the live selection, sent on
/// the remote channel whenever an item starts playing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NowPlayingPayload {
    pub track_id: u64,
    pub track_provider_id: String,
}

impl From<&TrackRef> for NowPlayingPayload {
    fn from(track: &TrackRef) -> Self {
        Self {
            track_id: track.id,
            track_provider_id: track.provider_id.clone(),
        }
    }
}

/// Transport control verbs carried on the `playerState` topic.
///
/// The wire payload is a case-insensitive string; parsing happens once at
/// the channel edge so the controller dispatches on a closed enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCommand {
    Play,
    Pause,
    Next,
    Previous,
}

impl TransportCommand {
    /// Parse a `playerState` payload string. Unrecognized verbs yield
    /// `None`; callers ignore them without error.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "PLAY" => Some(TransportCommand::Play),
            "PAUSE" => Some(TransportCommand::Pause),
            "NEXT" => Some(TransportCommand::Next),
            "PREVIOUS" => Some(TransportCommand::Previous),
            _ => None,
        }
    }
}
