//! End-to-end control flow tests
//!
//! Drive the controller the way the real process does: commands arrive
//! as PUT messages on either channel, readiness flows back from the
//! backend, and now-playing announcements leave on the remote channel.

use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::sync::mpsc;

use cloudradio_common::{MessageMethod, Topic, TrackRef};
use cloudradio_player::backend::InstantBackend;
use cloudradio_player::bus::{LocalBus, MessageBus};
use cloudradio_player::controller::Command;
use cloudradio_player::mixer::VolumeState;
use cloudradio_player::queue::PlayQueueItemStatus;
use cloudradio_player::PlayerController;

struct TestRig {
    controller: PlayerController,
    /// Same-device control surface channel
    local: Arc<LocalBus>,
    /// Stands in for the remote socket channel
    remote: Arc<LocalBus>,
    announcements: Arc<Mutex<Vec<serde_json::Value>>>,
    ready_rx: mpsc::UnboundedReceiver<TrackRef>,
}

fn rig() -> TestRig {
    let local = Arc::new(LocalBus::new());
    let remote = Arc::new(LocalBus::new());

    let announcements = Arc::new(Mutex::new(Vec::new()));
    let sink = announcements.clone();
    remote.subscribe(
        Topic::QueueItem,
        MessageMethod::Put,
        Arc::new(move |message| {
            sink.lock().unwrap().push(message.payload.clone());
        }),
    );

    let (ready_tx, ready_rx) = mpsc::unbounded_channel();
    let (_stub_tx, stub_rx) = mpsc::unbounded_channel();
    let backend = Arc::new(InstantBackend::new(ready_tx));

    let controller = PlayerController::new(
        backend,
        remote.clone(),
        None,
        VolumeState::default(),
        stub_rx,
    );
    controller.attach_buses(&[local.as_ref() as &dyn MessageBus, remote.as_ref()]);

    TestRig {
        controller,
        local,
        remote,
        announcements,
        ready_rx,
    }
}

impl TestRig {
    /// Process bus-delivered commands, then any backend ready signals
    fn settle(&mut self) {
        self.controller.process_pending_commands();
        while let Ok(track) = self.ready_rx.try_recv() {
            self.controller.handle_command(Command::TrackReady(track));
        }
        self.controller.process_pending_commands();
    }

    fn announced(&self) -> Vec<serde_json::Value> {
        self.announcements.lock().unwrap().clone()
    }
}

fn queue_payload(ids: &[u64]) -> serde_json::Value {
    json!(ids
        .iter()
        .map(|id| json!({"track": {"id": id, "providerId": "soundcloud"}}))
        .collect::<Vec<_>>())
}

#[test]
fn test_full_scenario_queue_then_next() {
    let mut rig = rig();

    // Queue [A, B] arrives on the remote channel
    rig.remote
        .send_message(Topic::Queue, MessageMethod::Put, queue_payload(&[11, 22]));
    rig.controller.process_pending_commands();

    // A is loading, nothing announced yet
    assert!(rig.controller.is_loading());
    assert_eq!(
        rig.controller.queue().current().unwrap().status,
        PlayQueueItemStatus::RequestedPlaying
    );
    assert!(rig.announced().is_empty());

    rig.settle();
    assert!(!rig.controller.is_loading());
    assert_eq!(
        rig.controller.queue().playing().unwrap().track,
        TrackRef::new(11, "soundcloud")
    );

    // NEXT arrives on the in-process channel; lowercase is accepted
    rig.local
        .send_message(Topic::PlayerState, MessageMethod::Put, json!("next"));
    rig.settle();

    let items = rig.controller.queue().items();
    assert_eq!(items[0].status, PlayQueueItemStatus::Stopped);
    assert_eq!(items[1].status, PlayQueueItemStatus::Playing);

    // Exactly two announcements, A then B
    assert_eq!(
        rig.announced(),
        vec![
            json!({"track_id": 11, "track_provider_id": "soundcloud"}),
            json!({"track_id": 22, "track_provider_id": "soundcloud"}),
        ]
    );
}

#[test]
fn test_commands_are_channel_agnostic() {
    let mut rig = rig();

    // Volume on the in-process channel, noise on the remote channel
    rig.local
        .send_message(Topic::Volume, MessageMethod::Put, json!(60));
    rig.remote
        .send_message(Topic::Noise, MessageMethod::Put, json!(50));
    rig.settle();

    let volume = rig.controller.volume();
    assert_eq!(volume.master, 60.0);
    assert_eq!(volume.noise_fraction, 50.0);
    assert!((volume.player_volume - 30.0).abs() < 1e-9);
    assert!((volume.noise_volume - 30.0).abs() < 1e-9);
}

#[test]
fn test_unrecognized_player_state_has_no_effect() {
    let mut rig = rig();
    rig.remote
        .send_message(Topic::Queue, MessageMethod::Put, queue_payload(&[7]));
    rig.settle();

    let volume_before = rig.controller.volume();
    rig.local
        .send_message(Topic::PlayerState, MessageMethod::Put, json!("SHUFFLE"));
    rig.settle();

    assert_eq!(rig.controller.queue().cursor(), Some(0));
    assert_eq!(
        rig.controller.queue().playing().unwrap().track,
        TrackRef::new(7, "soundcloud")
    );
    assert_eq!(rig.controller.volume(), volume_before);
    assert_eq!(rig.announced().len(), 1);
}

#[test]
fn test_malformed_queue_payload_rejected() {
    let mut rig = rig();
    rig.remote
        .send_message(Topic::Queue, MessageMethod::Put, json!("not a queue"));
    rig.settle();

    assert!(rig.controller.queue().is_empty());
    assert!(!rig.controller.is_loading());
}

#[test]
fn test_get_method_messages_do_not_reach_handlers() {
    let mut rig = rig();
    // Handlers are registered for PUT only
    rig.local
        .send_message(Topic::Volume, MessageMethod::Get, json!(10));
    rig.settle();
    assert_eq!(rig.controller.volume().master, 100.0);
}

#[test]
fn test_loading_watch_observes_transitions() {
    let mut rig = rig();
    let watch = rig.controller.loading_watch();
    assert!(!*watch.borrow());

    rig.remote
        .send_message(Topic::Queue, MessageMethod::Put, queue_payload(&[3]));
    rig.controller.process_pending_commands();
    assert!(*watch.borrow());

    rig.settle();
    assert!(!*watch.borrow());
}
