//! Playback controller
//!
//! The stateful glue between the message buses, the play queue, the
//! volume mixer and the playback backend. Inbound commands from either
//! channel collapse into one [`Command`] queue consumed by a single
//! dispatch loop, so every mutation of the queue and volume state is
//! serialized regardless of which transport delivered the callback.
//!
//! Queue status changes flow back through the queue's broadcast channel:
//! `RequestedPlaying` raises the loading indicator, `Playing` clears it
//! and announces the live selection on the remote channel (and only
//! there — no loopback echo on the in-process channel).

use std::sync::Arc;

use cloudradio_common::{
    Message, MessageMethod, NowPlayingPayload, QueuePayloadEntry, Topic, TrackRef,
    TransportCommand,
};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, warn};

use crate::backend::PlaybackBackend;
use crate::bus::MessageBus;
use crate::error::{Error, Result};
use crate::mixer::VolumeState;
use crate::queue::{PlayQueue, PlayQueueItem, PlayQueueItemStatus, QueueEvent};

/// Topics carrying inbound commands; registered on every attached bus
const INBOUND_TOPICS: [Topic; 4] = [
    Topic::Queue,
    Topic::PlayerState,
    Topic::Volume,
    Topic::Noise,
];

/// A fully parsed inbound command, uniform across both channels
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Replace the entire queue and start playing its first item
    ReplaceQueue(Vec<QueuePayloadEntry>),

    /// Transport control: play / pause / next / previous
    Transport(TransportCommand),

    /// Set master volume (0-100, clamped on apply)
    SetMasterVolume(f64),

    /// Set noise fraction (0-100, clamped on apply)
    SetNoiseFraction(f64),

    /// Backend finished loading a track; completes `RequestedPlaying`
    TrackReady(TrackRef),
}

impl Command {
    /// Parse an inbound bus message into a command.
    ///
    /// Payloads that do not match their topic's shape are rejected as
    /// malformed; an unrecognized `playerState` verb is the softer
    /// [`Error::UnknownCommand`], which callers drop without complaint.
    pub fn from_message(message: &Message) -> Result<Self> {
        match message.topic {
            Topic::Queue => {
                let entries: Vec<QueuePayloadEntry> =
                    serde_json::from_value(message.payload.clone()).map_err(|e| {
                        Error::MalformedPayload {
                            topic: "queue",
                            reason: e.to_string(),
                        }
                    })?;
                Ok(Command::ReplaceQueue(entries))
            }
            Topic::PlayerState => {
                let raw = message
                    .payload
                    .as_str()
                    .ok_or_else(|| Error::MalformedPayload {
                        topic: "playerState",
                        reason: "expected a string payload".to_string(),
                    })?;
                TransportCommand::parse(raw)
                    .map(Command::Transport)
                    .ok_or_else(|| Error::UnknownCommand(raw.to_string()))
            }
            Topic::Volume => Ok(Command::SetMasterVolume(number_payload(message, "volume")?)),
            Topic::Noise => Ok(Command::SetNoiseFraction(number_payload(message, "noise")?)),
            Topic::QueueItem => Err(Error::MalformedPayload {
                topic: "queue_item",
                reason: "outbound-only topic".to_string(),
            }),
        }
    }
}

fn number_payload(message: &Message, topic: &'static str) -> Result<f64> {
    message
        .payload
        .as_f64()
        .ok_or_else(|| Error::MalformedPayload {
            topic,
            reason: "expected a number payload".to_string(),
        })
}

/// Owns the play queue, noise queue and volume state; the only mutator
/// of all three.
pub struct PlayerController {
    queue: PlayQueue,
    noise_queue: PlayQueue,
    volume: VolumeState,
    backend: Arc<dyn PlaybackBackend>,
    remote: Arc<dyn MessageBus>,
    commands_tx: mpsc::UnboundedSender<Command>,
    commands_rx: mpsc::UnboundedReceiver<Command>,
    ready_rx: mpsc::UnboundedReceiver<TrackRef>,
    queue_events: broadcast::Receiver<QueueEvent>,
    loading_tx: watch::Sender<bool>,
}

impl PlayerController {
    /// Create a controller.
    ///
    /// `remote` is the channel that receives now-playing announcements;
    /// `ready_rx` carries track-ready notifications from the backend.
    /// When a noise track is configured it is seeded into the noise
    /// queue, to be started by [`PlayerController::start`].
    pub fn new(
        backend: Arc<dyn PlaybackBackend>,
        remote: Arc<dyn MessageBus>,
        noise_track: Option<TrackRef>,
        initial_volume: VolumeState,
        ready_rx: mpsc::UnboundedReceiver<TrackRef>,
    ) -> Self {
        let queue = PlayQueue::new();
        let queue_events = queue.subscribe();

        let mut noise_queue = PlayQueue::new();
        if let Some(track) = noise_track {
            noise_queue.add([PlayQueueItem::new(track)]);
        }

        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (loading_tx, _) = watch::channel(false);

        Self {
            queue,
            noise_queue,
            volume: initial_volume,
            backend,
            remote,
            commands_tx,
            commands_rx,
            ready_rx,
            queue_events,
            loading_tx,
        }
    }

    /// Sender half of the command queue, for surfaces that inject
    /// commands without going through a bus
    pub fn command_sender(&self) -> mpsc::UnboundedSender<Command> {
        self.commands_tx.clone()
    }

    /// Register the inbound command handlers on each given bus.
    ///
    /// The same handler set is registered on every bus, so a command has
    /// identical effect regardless of its origin channel. Handlers only
    /// parse and forward into the command queue; all state mutation
    /// happens on the dispatch loop.
    pub fn attach_buses(&self, buses: &[&dyn MessageBus]) {
        for bus in buses {
            for topic in INBOUND_TOPICS {
                let commands = self.commands_tx.clone();
                bus.subscribe(
                    topic,
                    MessageMethod::Put,
                    Arc::new(move |message| match Command::from_message(message) {
                        Ok(command) => {
                            let _ = commands.send(command);
                        }
                        Err(Error::UnknownCommand(raw)) => {
                            debug!(command = %raw, "ignoring unrecognized player state command");
                        }
                        Err(e) => {
                            warn!(topic = %message.topic, "rejecting inbound message: {e}");
                        }
                    }),
                );
            }
        }
    }

    /// Apply startup state: push initial volumes to the backend and
    /// begin ambient noise playback when a noise track is configured.
    pub fn start(&mut self) {
        self.backend
            .set_volumes(self.volume.player_volume, self.volume.noise_volume);

        if !self.noise_queue.is_empty() {
            match self.noise_queue.request_play() {
                Ok(Some(track)) => {
                    info!(%track, "starting ambient noise track");
                    self.backend.load(&track);
                }
                Ok(None) => {}
                Err(e) => warn!("cannot start noise track: {e}"),
            }
        }
    }

    /// Run the dispatch loop until the process shuts down.
    ///
    /// This is the sole place queue or volume state is mutated, which
    /// keeps handler execution serialized even when the two channels
    /// deliver callbacks concurrently.
    pub async fn run(&mut self) {
        self.start();
        loop {
            tokio::select! {
                Some(track) = self.ready_rx.recv() => {
                    self.handle_command(Command::TrackReady(track));
                }
                command = self.commands_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
        }
    }

    /// Execute one command, then react to the status changes it caused
    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::ReplaceQueue(entries) => self.replace_queue(entries),
            Command::Transport(transport) => {
                let result = match transport {
                    TransportCommand::Play => self.play(),
                    TransportCommand::Pause => self.pause(),
                    TransportCommand::Next => self.next(),
                    TransportCommand::Previous => self.previous(),
                };
                if let Err(e) = result {
                    // Recoverable by design: the command simply had no effect
                    debug!(command = ?transport, "transport command rejected: {e}");
                }
            }
            Command::SetMasterVolume(volume) => {
                self.apply_volume(self.volume.with_master(volume.clamp(0.0, 100.0)));
            }
            Command::SetNoiseFraction(fraction) => {
                self.apply_volume(self.volume.with_noise_fraction(fraction.clamp(0.0, 100.0)));
            }
            Command::TrackReady(track) => self.track_ready(track),
        }
        self.process_queue_events();
    }

    /// Drain commands already queued by bus handlers without blocking.
    ///
    /// For hosts that embed the controller in their own event loop
    /// instead of calling [`PlayerController::run`].
    pub fn process_pending_commands(&mut self) {
        while let Ok(command) = self.commands_rx.try_recv() {
            self.handle_command(command);
        }
    }

    /// Drain pending queue status notifications and react to each
    pub fn process_queue_events(&mut self) {
        loop {
            match self.queue_events.try_recv() {
                Ok(event) => self.on_queue_event(event),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "queue event stream lagged");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    fn on_queue_event(&mut self, event: QueueEvent) {
        let QueueEvent::StatusChanged { item, .. } = event;
        match item.status {
            PlayQueueItemStatus::RequestedPlaying => self.set_loading(true),
            PlayQueueItemStatus::Playing => {
                self.set_loading(false);
                self.announce_now_playing(&item.track);
            }
            _ => {}
        }
    }

    fn replace_queue(&mut self, entries: Vec<QueuePayloadEntry>) {
        info!(items = entries.len(), "replacing play queue");
        self.set_loading(true);
        self.queue.reset();
        self.queue.add_payload(entries);
        if let Err(e) = self.play() {
            warn!("cannot start replaced queue: {e}");
            self.set_loading(false);
        }
    }

    /// Play the current item (resume or first start)
    fn play(&mut self) -> Result<()> {
        let current = self
            .queue
            .current()
            .ok_or(Error::NoCurrentItem)?
            .track
            .clone();
        self.queue.stop_others(&current);
        if let Some(track) = self.queue.request_play()? {
            self.backend.load(&track);
        }
        Ok(())
    }

    /// Pause the playing item
    fn pause(&mut self) -> Result<()> {
        let track = self.queue.pause_playing()?;
        self.backend.pause(&track);
        Ok(())
    }

    /// Advance to the next item and play it
    fn next(&mut self) -> Result<()> {
        if !self.queue.has_next() {
            return Err(Error::NoNextItem);
        }
        self.queue.next()?;
        self.play()
    }

    /// Step back to the previous item and play it
    fn previous(&mut self) -> Result<()> {
        if !self.queue.has_previous() {
            return Err(Error::NoPreviousItem);
        }
        self.queue.previous()?;
        self.play()
    }

    fn track_ready(&mut self, track: TrackRef) {
        // The noise queue never announces; check it first
        if self.noise_queue.mark_playing(&track) {
            debug!(%track, "noise track playing");
            return;
        }
        if !self.queue.mark_playing(&track) {
            debug!(%track, "ready signal for a track no longer awaited");
        }
    }

    fn apply_volume(&mut self, state: VolumeState) {
        self.volume = state;
        self.backend
            .set_volumes(state.player_volume, state.noise_volume);
        debug!(
            master = state.master,
            player = state.player_volume,
            noise = state.noise_volume,
            "volume remixed"
        );
    }

    /// Publish the live selection on the remote channel.
    ///
    /// Intentionally not echoed onto the in-process channel; same-device
    /// surfaces observe the queue directly.
    fn announce_now_playing(&self, track: &TrackRef) {
        match serde_json::to_value(NowPlayingPayload::from(track)) {
            Ok(payload) => {
                self.remote
                    .send_message(Topic::QueueItem, MessageMethod::Put, payload);
            }
            Err(e) => warn!("failed to encode now-playing announcement: {e}"),
        }
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading_tx.send_if_modified(|current| {
            if *current != loading {
                *current = loading;
                debug!(loading, "loading indicator");
                true
            } else {
                false
            }
        });
    }

    /// Whether a play request is currently loading/seeking
    pub fn is_loading(&self) -> bool {
        *self.loading_tx.borrow()
    }

    /// Observe the loading indicator (for same-device UI surfaces)
    pub fn loading_watch(&self) -> watch::Receiver<bool> {
        self.loading_tx.subscribe()
    }

    pub fn queue(&self) -> &PlayQueue {
        &self.queue
    }

    pub fn noise_queue(&self) -> &PlayQueue {
        &self.noise_queue
    }

    pub fn volume(&self) -> VolumeState {
        self.volume
    }
}
