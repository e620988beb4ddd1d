//! In-process transport.
//!
//! Each successful `connect` hands the far end of the session to whoever
//! holds the receiver returned by [`MemoryConnector::new`].

use super::{ChannelTransport, Connection, Connector};
use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use zybot_proto::{ClientOp, LoginOptions, ServerEvent};

/// Far end of an in-memory session: plays the part of the bridge.
pub struct MemoryBridge {
    /// Login the bot sent when opening the session.
    pub login: LoginOptions,
    events: mpsc::Sender<ServerEvent>,
    ops: mpsc::UnboundedReceiver<ClientOp>,
}

impl MemoryBridge {
    /// Push an event to the bot. Returns `false` once the bot stopped listening.
    pub async fn emit(&self, event: ServerEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// Next op the bot sent, or `None` once the transport is dropped.
    pub async fn next_op(&mut self) -> Option<ClientOp> {
        self.ops.recv().await
    }

    /// Next chat line the bot sent, skipping other ops.
    pub async fn next_chat(&mut self) -> Option<String> {
        loop {
            if let ClientOp::Chat { message } = self.ops.recv().await? {
                return Some(message);
            }
        }
    }

    /// Ops already queued, without waiting.
    pub fn drain_ops(&mut self) -> Vec<ClientOp> {
        let mut ops = Vec::new();
        while let Ok(op) = self.ops.try_recv() {
            ops.push(op);
        }
        ops
    }
}

/// [`Connector`] that opens in-process sessions.
pub struct MemoryConnector {
    sessions: mpsc::UnboundedSender<MemoryBridge>,
    refuse: AtomicBool,
}

impl MemoryConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MemoryBridge>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                sessions: tx,
                refuse: AtomicBool::new(false),
            },
            rx,
        )
    }

    /// Make subsequent connects fail as if the bridge were down.
    pub fn set_refuse(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, login: &LoginOptions) -> Result<Connection, TransportError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(TransportError::Connect {
                addr: "memory".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
            });
        }

        let (op_tx, op_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(64);

        self.sessions
            .send(MemoryBridge {
                login: login.clone(),
                events: event_tx,
                ops: op_rx,
            })
            .map_err(|_| TransportError::Closed)?;

        Ok(Connection {
            transport: Arc::new(ChannelTransport::new(op_tx)),
            events: event_rx,
        })
    }
}
