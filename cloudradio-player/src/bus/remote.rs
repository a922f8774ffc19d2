//! Remote message channel (persistent websocket)
//!
//! Connects once to the configured server endpoint and keeps the socket
//! open for the life of the process. Inbound frames are decoded and
//! dispatched to the handler registry; outbound messages go through an
//! unbounded writer queue so sends never block the caller.
//!
//! Send policy when the socket is unavailable (playback must not crash on
//! transient network loss):
//! - before `connect`: messages accumulate in a bounded buffer
//!   ([`PENDING_LIMIT`], oldest dropped) and are flushed on connect
//! - after the connection drops: sends become logged no-ops

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use tracing::{debug, info, trace, warn};

use cloudradio_common::{Message, MessageMethod, Topic};

use super::{Handler, HandlerRegistry, MessageBus};
use crate::error::{Error, Result};

/// Capacity of the pre-connect outbound buffer
pub const PENDING_LIMIT: usize = 64;

/// Outbound delivery state, before and after connection establishment
struct Outbound {
    /// Writer queue of the live connection, `None` until connected and
    /// again after the connection drops
    tx: Option<mpsc::UnboundedSender<Message>>,

    /// Messages sent before the connection was established
    pending: VecDeque<Message>,

    /// Whether a connection has ever been established; distinguishes
    /// pre-connect buffering from post-disconnect no-ops
    ever_connected: bool,
}

/// Remote bus instance over one persistent websocket connection
pub struct SocketBus {
    registry: HandlerRegistry,
    outbound: Arc<Mutex<Outbound>>,
    connected: Arc<AtomicBool>,
    connect_called: AtomicBool,
}

impl SocketBus {
    pub fn new() -> Self {
        Self {
            registry: HandlerRegistry::new(),
            outbound: Arc::new(Mutex::new(Outbound {
                tx: None,
                pending: VecDeque::new(),
                ever_connected: false,
            })),
            connected: Arc::new(AtomicBool::new(false)),
            connect_called: AtomicBool::new(false),
        }
    }

    /// Establish the connection and spawn the reader/writer tasks.
    ///
    /// Callable once per bus instance; a failed attempt may be retried.
    /// Messages sent before this call are flushed in order once the
    /// socket is up.
    pub async fn connect(&self, url: &str) -> Result<()> {
        if self.connect_called.swap(true, Ordering::SeqCst) {
            return Err(Error::Transport(
                "connect() already called for this bus instance".to_string(),
            ));
        }

        let (ws_stream, _) = match connect_async(url).await {
            Ok(connection) => connection,
            Err(e) => {
                self.connect_called.store(false, Ordering::SeqCst);
                return Err(Error::Transport(format!("{url}: {e}")));
            }
        };
        info!(url, "remote channel connected");

        let (mut write, mut read) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        {
            let mut outbound = self.outbound.lock().unwrap();
            let flushed = outbound.pending.len();
            for message in outbound.pending.drain(..) {
                let _ = tx.send(message);
            }
            if flushed > 0 {
                debug!(flushed, "flushed pre-connect messages");
            }
            outbound.tx = Some(tx);
            outbound.ever_connected = true;
        }
        self.connected.store(true, Ordering::SeqCst);

        // Writer: drains the outbound queue onto the socket
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                match serde_json::to_string(&message) {
                    Ok(json) => {
                        if write.send(WsMessage::Text(json)).await.is_err() {
                            warn!("remote channel write failed");
                            break;
                        }
                    }
                    Err(e) => warn!("failed to encode outbound message: {e}"),
                }
            }
        });

        // Reader: decodes inbound frames and dispatches to handlers
        let registry = self.registry.clone();
        let connected = self.connected.clone();
        let outbound = self.outbound.clone();
        tokio::spawn(async move {
            while let Some(frame) = read.next().await {
                match frame {
                    Ok(WsMessage::Text(text)) => match serde_json::from_str::<Message>(&text) {
                        Ok(message) => {
                            let delivered = registry.dispatch(&message);
                            trace!(
                                topic = %message.topic,
                                delivered,
                                "remote message dispatched"
                            );
                        }
                        Err(e) => warn!("ignoring malformed remote frame: {e}"),
                    },
                    Ok(WsMessage::Close(_)) => break,
                    Ok(_) => {} // ping/pong/binary frames
                    Err(e) => {
                        warn!("remote channel read error: {e}");
                        break;
                    }
                }
            }
            connected.store(false, Ordering::SeqCst);
            outbound.lock().unwrap().tx = None;
            info!("remote channel disconnected");
        });

        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.outbound.lock().unwrap().pending.len()
    }
}

impl Default for SocketBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus for SocketBus {
    fn subscribe(&self, topic: Topic, method: MessageMethod, handler: Handler) {
        self.registry.register(topic, method, handler);
    }

    fn send_message(&self, topic: Topic, method: MessageMethod, payload: serde_json::Value) {
        let message = Message::new(topic, method, payload);
        let mut outbound = self.outbound.lock().unwrap();

        if let Some(tx) = &outbound.tx {
            if tx.send(message).is_err() {
                outbound.tx = None;
                warn!(%topic, "remote channel writer gone; message dropped");
            }
            return;
        }

        if outbound.ever_connected {
            debug!(%topic, "remote channel disconnected; message dropped");
            return;
        }

        if outbound.pending.len() == PENDING_LIMIT {
            outbound.pending.pop_front();
            warn!("pre-connect buffer full; oldest message dropped");
        }
        outbound.pending.push_back(message);
    }
}
