//! Message bus contract over the two transport channels
//!
//! Both channels — the in-process [`LocalBus`] and the remote
//! [`SocketBus`] — expose the same subscribe/send contract, so the
//! controller treats them polymorphically and never knows which transport
//! carried a given message.

mod local;
mod remote;

pub use local::LocalBus;
pub use remote::SocketBus;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use cloudradio_common::{Message, MessageMethod, Topic};

/// Callback invoked for every message matching its (topic, method) key.
///
/// Handlers must be cheap and non-blocking; transports invoke them on
/// their own delivery task. Controller handlers only forward a parsed
/// command into the dispatch queue.
pub type Handler = Arc<dyn Fn(&Message) + Send + Sync>;

/// Uniform publish/subscribe abstraction over one transport channel
pub trait MessageBus: Send + Sync {
    /// Register a handler for the exact (topic, method) pair.
    ///
    /// Registration is not deduplicated: registering the same handler
    /// twice yields two invocations per message. Subscribing before the
    /// transport is connected is legal.
    fn subscribe(&self, topic: Topic, method: MessageMethod, handler: Handler);

    /// Serialize a payload and dispatch it to the channel's peer.
    ///
    /// Never panics on transport unavailability; delivery degrades per
    /// the transport's policy (see [`SocketBus`]).
    fn send_message(&self, topic: Topic, method: MessageMethod, payload: serde_json::Value);
}

/// Handler registration table shared by both bus implementations:
/// `(topic, method)` to the handlers registered for it, in registration
/// order.
#[derive(Clone, Default)]
pub(crate) struct HandlerRegistry {
    handlers: Arc<Mutex<HashMap<(Topic, MessageMethod), Vec<Handler>>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, topic: Topic, method: MessageMethod, handler: Handler) {
        self.handlers
            .lock()
            .unwrap()
            .entry((topic, method))
            .or_default()
            .push(handler);
    }

    /// Invoke every handler registered for the message's (topic, method)
    /// pair, in registration order. Returns the number invoked.
    ///
    /// The matching handlers are cloned out before invocation so a
    /// handler may itself subscribe without deadlocking.
    pub fn dispatch(&self, message: &Message) -> usize {
        let matching: Vec<Handler> = self
            .handlers
            .lock()
            .unwrap()
            .get(&(message.topic, message.method))
            .cloned()
            .unwrap_or_default();

        for handler in &matching {
            handler(message);
        }
        matching.len()
    }
}
