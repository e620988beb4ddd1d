//! Fake game bridge.
//!
//! Listens on a loopback port and speaks the JSON-lines bridge protocol, so
//! tests drive the bot exactly the way a real bridge process would.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use zybot_proto::{ClientOp, LoginOptions, ServerEvent};

/// A listening fake bridge.
pub struct FakeBridge {
    listener: TcpListener,
}

impl FakeBridge {
    /// Bind to an ephemeral loopback port.
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self { listener })
    }

    pub fn address(&self) -> String {
        self.listener
            .local_addr()
            .map(|a| a.to_string())
            .unwrap_or_default()
    }

    /// Accept the next bot connection and read its login op.
    pub async fn accept(&self) -> anyhow::Result<(BridgeClient, LoginOptions)> {
        let (stream, _) = timeout(Duration::from_secs(5), self.listener.accept()).await??;
        let mut client = BridgeClient::new(stream);
        match client.recv().await? {
            ClientOp::Login(login) => Ok((client, login)),
            other => anyhow::bail!("expected login, got {other:?}"),
        }
    }
}

/// One bot session as seen from the bridge side.
pub struct BridgeClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl BridgeClient {
    fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        }
    }

    /// Send an event to the bot.
    pub async fn emit(&mut self, event: ServerEvent) -> anyhow::Result<()> {
        self.writer.write_all(event.encode()?.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Send a raw line, valid or not.
    #[allow(dead_code)]
    pub async fn emit_raw(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Report a spawn, as the bridge does once the bot is in the world.
    pub async fn spawn(&mut self, username: &str) -> anyhow::Result<()> {
        self.emit(ServerEvent::Spawn {
            username: Some(username.to_string()),
        })
        .await
    }

    /// A player says something.
    #[allow(dead_code)]
    pub async fn say(&mut self, username: &str, message: &str) -> anyhow::Result<()> {
        self.emit(ServerEvent::Chat {
            username: username.to_string(),
            message: message.to_string(),
        })
        .await
    }

    /// Receive the next op from the bot.
    pub async fn recv(&mut self) -> anyhow::Result<ClientOp> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<ClientOp> {
        let mut line = String::new();
        let read = timeout(dur, self.reader.read_line(&mut line)).await??;
        if read == 0 {
            anyhow::bail!("bot closed the connection");
        }
        line.parse::<ClientOp>()
            .map_err(|e| anyhow::anyhow!("parse error: {e}"))
    }

    /// Receive ops until the next chat line and return its text.
    #[allow(dead_code)]
    pub async fn next_chat(&mut self) -> anyhow::Result<String> {
        loop {
            if let ClientOp::Chat { message } = self.recv().await? {
                return Ok(message);
            }
        }
    }

    /// Assert nothing arrives within `dur`.
    #[allow(dead_code)]
    pub async fn expect_silence(&mut self, dur: Duration) -> anyhow::Result<()> {
        match self.recv_timeout(dur).await {
            Ok(op) => anyhow::bail!("unexpected op {op:?}"),
            Err(_) => Ok(()),
        }
    }

    /// Drop the connection from the bridge side.
    #[allow(dead_code)]
    pub async fn close(mut self) -> anyhow::Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}
