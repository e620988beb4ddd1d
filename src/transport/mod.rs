//! Game transport seam.
//!
//! A [`Connector`] opens a session with the game and hands back a
//! [`Connection`]: a [`Transport`] to push ops through and a stream of
//! [`ServerEvent`]s. The supervisor only ever talks to these traits.
//!
//! - [`bridge`]: JSON lines over TCP to an external game-client process
//! - [`memory`]: in-process pair for tests and embedding

pub mod bridge;
pub mod memory;

pub use bridge::BridgeConnector;
pub use memory::{MemoryBridge, MemoryConnector};

use crate::error::TransportError;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use zybot_proto::{ClientOp, LoginOptions, ServerEvent};

/// Outbound half of a game session.
pub trait Transport: Send + Sync {
    /// Queue an op for delivery. Never blocks.
    fn send(&self, op: ClientOp) -> Result<(), TransportError>;
}

/// A freshly opened game session.
pub struct Connection {
    pub transport: Arc<dyn Transport>,
    /// Inbound events. Closing the channel means the session ended.
    pub events: mpsc::Receiver<ServerEvent>,
}

/// Opens game sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, login: &LoginOptions) -> Result<Connection, TransportError>;
}

/// [`Transport`] backed by an unbounded channel drained by a link task.
pub(crate) struct ChannelTransport {
    tx: mpsc::UnboundedSender<ClientOp>,
}

impl ChannelTransport {
    pub(crate) fn new(tx: mpsc::UnboundedSender<ClientOp>) -> Self {
        Self { tx }
    }
}

impl Transport for ChannelTransport {
    fn send(&self, op: ClientOp) -> Result<(), TransportError> {
        self.tx.send(op).map_err(|_| TransportError::Closed)
    }
}
