//! In-process message channel
//!
//! Carries messages between control surfaces living in the same process
//! (the UI layer) and the playback controller. Delivery is synchronous
//! loopback: `send_message` dispatches directly to the handlers
//! registered on this bus instance. No network exposure.

use cloudradio_common::{Message, MessageMethod, Topic};
use tracing::trace;

use super::{Handler, HandlerRegistry, MessageBus};

/// In-process bus instance
#[derive(Clone, Default)]
pub struct LocalBus {
    registry: HandlerRegistry,
}

impl LocalBus {
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
        }
    }
}

impl MessageBus for LocalBus {
    fn subscribe(&self, topic: Topic, method: MessageMethod, handler: Handler) {
        self.registry.register(topic, method, handler);
    }

    fn send_message(&self, topic: Topic, method: MessageMethod, payload: serde_json::Value) {
        let message = Message::new(topic, method, payload);
        let delivered = self.registry.dispatch(&message);
        trace!(%topic, %method, delivered, "local bus message dispatched");
    }
}
