//! Playback backend seam
//!
//! The actual media engine (resolving, decoding, buffering) lives outside
//! this control core. The controller drives it through this trait and
//! learns about readiness through the track-ready channel: once the
//! backend has the resource ready, the track flows back into the
//! controller's dispatch loop and the item transitions
//! `RequestedPlaying → Playing`.

use cloudradio_common::TrackRef;
use tokio::sync::mpsc;
use tracing::debug;

/// Interface boundary to the external media engine
pub trait PlaybackBackend: Send + Sync {
    /// Begin loading/seeking the given track for playback
    fn load(&self, track: &TrackRef);

    /// Pause the given track
    fn pause(&self, track: &TrackRef);

    /// Apply the effective volume split (content, noise), both 0-100
    fn set_volumes(&self, player_volume: f64, noise_volume: f64);
}

/// Backend that reports every track ready immediately.
///
/// Stands in for a real media engine in the binary and in tests; useful
/// wherever resource acquisition latency is irrelevant to the logic
/// under test.
pub struct InstantBackend {
    ready_tx: mpsc::UnboundedSender<TrackRef>,
}

impl InstantBackend {
    /// `ready_tx` is the controller's track-ready channel
    pub fn new(ready_tx: mpsc::UnboundedSender<TrackRef>) -> Self {
        Self { ready_tx }
    }
}

impl PlaybackBackend for InstantBackend {
    fn load(&self, track: &TrackRef) {
        debug!(%track, "loading track");
        // Controller may already be gone during shutdown
        let _ = self.ready_tx.send(track.clone());
    }

    fn pause(&self, track: &TrackRef) {
        debug!(%track, "pausing track");
    }

    fn set_volumes(&self, player_volume: f64, noise_volume: f64) {
        debug!(player_volume, noise_volume, "volumes applied");
    }
}
