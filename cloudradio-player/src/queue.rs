//! Play queue with cursor-relative navigation and status notification
//!
//! The queue is a passive container plus notifier: it holds the ordered
//! items, tracks the cursor, and broadcasts a `QueueEvent` whenever any
//! item's status is mutated. It never calls back into the controller
//! directly; the broadcast channel is the sole queue-to-controller
//! coupling.

use cloudradio_common::{QueuePayloadEntry, TrackRef};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::{Error, Result};

/// Lifecycle states of a queued item.
///
/// `Idle → RequestedPlaying → Playing → Paused → Playing | Stopped`.
/// No state is terminal; any item can be replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum PlayQueueItemStatus {
    /// Never played since it was queued
    Idle,
    /// Playback requested, resource loading/seeking in progress
    RequestedPlaying,
    /// Audibly playing
    Playing,
    /// Paused mid-item
    Paused,
    /// Displaced by another item starting playback
    Stopped,
}

impl PlayQueueItemStatus {
    /// Whether the item currently holds (or is acquiring) playback
    pub fn is_active(self) -> bool {
        matches!(
            self,
            PlayQueueItemStatus::Playing | PlayQueueItemStatus::RequestedPlaying
        )
    }
}

impl std::fmt::Display for PlayQueueItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayQueueItemStatus::Idle => write!(f, "Idle"),
            PlayQueueItemStatus::RequestedPlaying => write!(f, "RequestedPlaying"),
            PlayQueueItemStatus::Playing => write!(f, "Playing"),
            PlayQueueItemStatus::Paused => write!(f, "Paused"),
            PlayQueueItemStatus::Stopped => write!(f, "Stopped"),
        }
    }
}

/// One playable unit with its own lifecycle status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayQueueItem {
    pub track: TrackRef,
    pub status: PlayQueueItemStatus,
}

impl PlayQueueItem {
    pub fn new(track: TrackRef) -> Self {
        Self {
            track,
            status: PlayQueueItemStatus::Idle,
        }
    }
}

/// Status change notifications emitted by the queue
#[derive(Debug, Clone)]
pub enum QueueEvent {
    /// An item's status field was mutated, by any operation
    StatusChanged {
        /// Snapshot of the affected item after the change
        item: PlayQueueItem,
        /// When the change happened
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

/// Ordered, mutable play queue.
///
/// Invariants:
/// - `cursor` is a valid index, or `None` iff the queue is empty
/// - at most one item is `Playing`/`RequestedPlaying` at a time
///   (enforced by the controller via [`PlayQueue::stop_others`])
pub struct PlayQueue {
    items: Vec<PlayQueueItem>,
    cursor: Option<usize>,
    event_tx: broadcast::Sender<QueueEvent>,
}

impl PlayQueue {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            items: Vec::new(),
            cursor: None,
            event_tx,
        }
    }

    /// Subscribe to status change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.event_tx.subscribe()
    }

    /// Clear all items and the cursor
    pub fn reset(&mut self) {
        self.items.clear();
        self.cursor = None;
    }

    /// Append items; the cursor lands on the first item when the queue
    /// was previously empty.
    pub fn add(&mut self, items: impl IntoIterator<Item = PlayQueueItem>) {
        self.items.extend(items);
        if self.cursor.is_none() && !self.items.is_empty() {
            self.cursor = Some(0);
        }
    }

    /// Parse a raw `queue` payload into owned items and append them
    pub fn add_payload(&mut self, entries: Vec<QueuePayloadEntry>) {
        self.add(
            entries
                .into_iter()
                .map(|entry| PlayQueueItem::new(entry.track.into())),
        );
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[PlayQueueItem] {
        &self.items
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// First item in queue order
    pub fn first(&self) -> Option<&PlayQueueItem> {
        self.items.first()
    }

    /// Item under the cursor
    pub fn current(&self) -> Option<&PlayQueueItem> {
        self.cursor.and_then(|i| self.items.get(i))
    }

    /// The item currently in `Playing` status, if any
    pub fn playing(&self) -> Option<&PlayQueueItem> {
        self.items
            .iter()
            .find(|item| item.status == PlayQueueItemStatus::Playing)
    }

    /// False at the last index or when the queue is empty
    pub fn has_next(&self) -> bool {
        match self.cursor {
            Some(i) => i + 1 < self.items.len(),
            None => false,
        }
    }

    /// False at the first index or when the queue is empty
    pub fn has_previous(&self) -> bool {
        matches!(self.cursor, Some(i) if i > 0)
    }

    /// Move the cursor to the next item and return it.
    ///
    /// Never wraps; past-the-end navigation is a reported failure.
    pub fn next(&mut self) -> Result<&PlayQueueItem> {
        if !self.has_next() {
            return Err(Error::NoNextItem);
        }
        let i = self.cursor.unwrap_or(0) + 1;
        self.cursor = Some(i);
        Ok(&self.items[i])
    }

    /// Move the cursor to the previous item and return it.
    pub fn previous(&mut self) -> Result<&PlayQueueItem> {
        if !self.has_previous() {
            return Err(Error::NoPreviousItem);
        }
        let i = self.cursor.unwrap_or(0) - 1;
        self.cursor = Some(i);
        Ok(&self.items[i])
    }

    /// Request playback of the current item.
    ///
    /// Returns the track to load, or `None` when the item is already
    /// `Playing` (a no-op per the lifecycle contract). Fails when the
    /// queue has no current item.
    pub fn request_play(&mut self) -> Result<Option<TrackRef>> {
        let index = self.cursor.ok_or(Error::NoCurrentItem)?;
        if self.items[index].status == PlayQueueItemStatus::Playing {
            return Ok(None);
        }
        let track = self.items[index].track.clone();
        self.set_status(index, PlayQueueItemStatus::RequestedPlaying);
        Ok(Some(track))
    }

    /// Complete a pending play request: `RequestedPlaying → Playing`.
    ///
    /// Returns true iff an item transitioned. Ready signals for tracks
    /// this queue is not waiting on are ignored.
    pub fn mark_playing(&mut self, track: &TrackRef) -> bool {
        let index = self.items.iter().position(|item| {
            item.status == PlayQueueItemStatus::RequestedPlaying && &item.track == track
        });
        match index {
            Some(i) => {
                self.set_status(i, PlayQueueItemStatus::Playing);
                true
            }
            None => false,
        }
    }

    /// Pause the playing item: `Playing → Paused`. Returns its track.
    pub fn pause_playing(&mut self) -> Result<TrackRef> {
        let index = self
            .items
            .iter()
            .position(|item| item.status == PlayQueueItemStatus::Playing)
            .ok_or(Error::NoPlayingItem)?;
        let track = self.items[index].track.clone();
        self.set_status(index, PlayQueueItemStatus::Paused);
        Ok(track)
    }

    /// Return every active item other than `keep` to `Stopped`.
    ///
    /// Called before playback moves to a different item, so that at most
    /// one item is ever active.
    pub fn stop_others(&mut self, keep: &TrackRef) {
        let displaced: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.status.is_active() && &item.track != keep)
            .map(|(i, _)| i)
            .collect();
        for i in displaced {
            self.set_status(i, PlayQueueItemStatus::Stopped);
        }
    }

    /// Mutate one item's status and notify subscribers.
    ///
    /// Every status change flows through here, regardless of which
    /// operation caused it.
    fn set_status(&mut self, index: usize, status: PlayQueueItemStatus) {
        self.items[index].status = status;
        // No subscribers is fine (lossy emission)
        let _ = self.event_tx.send(QueueEvent::StatusChanged {
            item: self.items[index].clone(),
            timestamp: chrono::Utc::now(),
        });
    }
}

impl Default for PlayQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: u64) -> TrackRef {
        TrackRef::new(id, "soundcloud")
    }

    fn queue_of(n: u64) -> PlayQueue {
        let mut queue = PlayQueue::new();
        queue.add((0..n).map(|i| PlayQueueItem::new(track(i))));
        queue
    }

    fn drain_status_changes(
        rx: &mut broadcast::Receiver<QueueEvent>,
    ) -> Vec<(TrackRef, PlayQueueItemStatus)> {
        let mut changes = Vec::new();
        while let Ok(QueueEvent::StatusChanged { item, .. }) = rx.try_recv() {
            changes.push((item.track, item.status));
        }
        changes
    }

    #[test]
    fn test_empty_queue() {
        let mut queue = PlayQueue::new();
        assert!(queue.is_empty());
        assert!(queue.cursor().is_none());
        assert!(queue.current().is_none());
        assert!(queue.first().is_none());
        assert!(!queue.has_next());
        assert!(!queue.has_previous());
        assert!(matches!(queue.request_play(), Err(Error::NoCurrentItem)));
    }

    #[test]
    fn test_add_sets_cursor_once() {
        let mut queue = PlayQueue::new();
        queue.add([PlayQueueItem::new(track(1))]);
        assert_eq!(queue.cursor(), Some(0));

        // Appending more does not move an established cursor
        queue.add([PlayQueueItem::new(track(2))]);
        assert_eq!(queue.cursor(), Some(0));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_reset_clears_items_and_cursor() {
        let mut queue = queue_of(3);
        queue.reset();
        assert!(queue.is_empty());
        assert!(queue.cursor().is_none());
    }

    #[test]
    fn test_navigation_bounds_single_item() {
        let mut queue = queue_of(1);
        assert!(!queue.has_next());
        assert!(!queue.has_previous());
        assert!(matches!(queue.next(), Err(Error::NoNextItem)));
        assert!(matches!(queue.previous(), Err(Error::NoPreviousItem)));
        // Failed navigation leaves the cursor alone
        assert_eq!(queue.cursor(), Some(0));
    }

    #[test]
    fn test_navigation_round_trip() {
        let n = 5;
        let mut queue = queue_of(n);
        for _ in 0..n - 1 {
            queue.next().unwrap();
        }
        assert_eq!(queue.cursor(), Some((n - 1) as usize));
        assert!(!queue.has_next());
        for _ in 0..n - 1 {
            queue.previous().unwrap();
        }
        assert_eq!(queue.cursor(), Some(0));
        assert_eq!(queue.current().unwrap().track, track(0));
    }

    #[test]
    fn test_request_play_emits_status_change() {
        let mut queue = queue_of(2);
        let mut rx = queue.subscribe();

        let loaded = queue.request_play().unwrap();
        assert_eq!(loaded, Some(track(0)));
        assert_eq!(
            queue.current().unwrap().status,
            PlayQueueItemStatus::RequestedPlaying
        );

        let changes = drain_status_changes(&mut rx);
        assert_eq!(
            changes,
            vec![(track(0), PlayQueueItemStatus::RequestedPlaying)]
        );
    }

    #[test]
    fn test_request_play_noop_when_already_playing() {
        let mut queue = queue_of(1);
        queue.request_play().unwrap();
        assert!(queue.mark_playing(&track(0)));

        let mut rx = queue.subscribe();
        assert_eq!(queue.request_play().unwrap(), None);
        assert!(drain_status_changes(&mut rx).is_empty());
    }

    #[test]
    fn test_mark_playing_requires_pending_request() {
        let mut queue = queue_of(2);
        // Nothing requested yet
        assert!(!queue.mark_playing(&track(0)));

        queue.request_play().unwrap();
        // Ready signal for a different track is ignored
        assert!(!queue.mark_playing(&track(1)));
        assert!(queue.mark_playing(&track(0)));
        assert_eq!(queue.playing().unwrap().track, track(0));
    }

    #[test]
    fn test_pause_playing() {
        let mut queue = queue_of(1);
        assert!(matches!(queue.pause_playing(), Err(Error::NoPlayingItem)));

        queue.request_play().unwrap();
        // RequestedPlaying is not pausable
        assert!(matches!(queue.pause_playing(), Err(Error::NoPlayingItem)));

        queue.mark_playing(&track(0));
        let paused = queue.pause_playing().unwrap();
        assert_eq!(paused, track(0));
        assert_eq!(queue.current().unwrap().status, PlayQueueItemStatus::Paused);
    }

    #[test]
    fn test_paused_item_can_resume() {
        let mut queue = queue_of(1);
        queue.request_play().unwrap();
        queue.mark_playing(&track(0));
        queue.pause_playing().unwrap();

        // Resume goes back through the loading handshake
        assert_eq!(queue.request_play().unwrap(), Some(track(0)));
        assert!(queue.mark_playing(&track(0)));
        assert_eq!(queue.playing().unwrap().track, track(0));
    }

    #[test]
    fn test_stop_others_displaces_active_items() {
        let mut queue = queue_of(2);
        queue.request_play().unwrap();
        queue.mark_playing(&track(0));

        queue.next().unwrap();
        let mut rx = queue.subscribe();
        queue.stop_others(&track(1));

        assert_eq!(queue.items()[0].status, PlayQueueItemStatus::Stopped);
        let changes = drain_status_changes(&mut rx);
        assert_eq!(changes, vec![(track(0), PlayQueueItemStatus::Stopped)]);

        // Idempotent: nothing left to displace
        queue.stop_others(&track(1));
        assert!(drain_status_changes(&mut rx).is_empty());
    }

    #[test]
    fn test_add_payload_parses_entries() {
        let entries: Vec<QueuePayloadEntry> = serde_json::from_str(
            r#"[
                {"track": {"id": 1, "providerId": "soundcloud"}},
                {"track": {"id": 2, "provider": "soundcloud"}}
            ]"#,
        )
        .unwrap();

        let mut queue = PlayQueue::new();
        queue.add_payload(entries);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.first().unwrap().track, track(1));
        assert_eq!(queue.items()[1].status, PlayQueueItemStatus::Idle);
    }
}
