//! Bridge transport: newline-delimited JSON over TCP.
//!
//! The bridge is an external process that speaks the game protocol on our
//! behalf. On connect we send a `login` op, then pump ops out and events in
//! until either side closes.

use super::{ChannelTransport, Connection, Connector};
use crate::error::TransportError;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{Instrument, debug, error, info, warn};
use zybot_proto::{ClientOp, LoginOptions, ServerEvent};

/// Longest line accepted from the bridge.
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Inbound events buffered before the link task waits on the supervisor.
const EVENT_QUEUE_SIZE: usize = 256;

/// Default limit on a single TCP connect.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connects to a bridge listening on a TCP address.
#[derive(Debug, Clone)]
pub struct BridgeConnector {
    address: String,
    connect_timeout: Duration,
}

impl BridgeConnector {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl Connector for BridgeConnector {
    async fn connect(&self, login: &LoginOptions) -> Result<Connection, TransportError> {
        info!(bridge = %self.address, host = %login.host, port = login.port, "Connecting to game bridge");

        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| TransportError::ConnectTimeout {
                addr: self.address.clone(),
                after: self.connect_timeout,
            })?
            .map_err(|source| TransportError::Connect {
                addr: self.address.clone(),
                source,
            })?;

        let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(MAX_LINE_LENGTH));
        framed
            .send(ClientOp::Login(login.clone()).encode()?)
            .await?;

        let (op_tx, op_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_SIZE);

        let span = tracing::info_span!("bridge", addr = %self.address);
        tokio::spawn(run_link(framed, op_rx, event_tx).instrument(span));

        Ok(Connection {
            transport: Arc::new(ChannelTransport::new(op_tx)),
            events: event_rx,
        })
    }
}

/// Pump ops to the bridge and events back until either side goes away.
///
/// Stream EOF and stream errors are reported as an `end` event.
async fn run_link(
    mut framed: Framed<TcpStream, LinesCodec>,
    mut ops: mpsc::UnboundedReceiver<ClientOp>,
    events: mpsc::Sender<ServerEvent>,
) {
    loop {
        tokio::select! {
            op = ops.recv() => {
                match op {
                    Some(op) => {
                        let line = match op.encode() {
                            Ok(line) => line,
                            Err(e) => {
                                warn!(error = %e, "Failed to encode bridge op");
                                continue;
                            }
                        };
                        if let Err(e) = framed.send(line).await {
                            error!(error = %e, "Failed to write to bridge");
                            let _ = events.send(end_event(e.to_string())).await;
                            break;
                        }
                    }
                    None => {
                        debug!("Transport dropped, closing bridge link");
                        break;
                    }
                }
            }
            result = framed.next() => {
                match result {
                    Some(Ok(line)) => {
                        if line.trim().is_empty() {
                            continue;
                        }
                        let event = match line.parse::<ServerEvent>() {
                            Ok(event) => event,
                            Err(e) => {
                                warn!(error = %e, line = %line, "Skipping unparseable bridge line");
                                continue;
                            }
                        };
                        if events.send(event).await.is_err() {
                            debug!("Session no longer listening, closing bridge link");
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        error!(error = %e, "Bridge stream error");
                        let _ = events.send(end_event(e.to_string())).await;
                        break;
                    }
                    None => {
                        info!("Bridge closed the connection");
                        let _ = events.send(end_event("bridge closed".to_string())).await;
                        break;
                    }
                }
            }
        }
    }
}

fn end_event(reason: String) -> ServerEvent {
    ServerEvent::End {
        reason: Some(reason),
    }
}
