//! Game-bridge protocol.
//!
//! The bot never speaks the game protocol itself. It talks to a bridge process
//! over a newline-delimited JSON stream: the bot sends [`ClientOp`]s and the
//! bridge answers with [`ServerEvent`]s.
//!
//! ```text
//! bot    -> bridge  {"op":"login","host":"mc.example.net","port":25565,...}
//! bridge -> bot     {"event":"spawn","username":"Fumumi_39"}
//! bridge -> bot     {"event":"chat","username":"alice","message":".zybot help"}
//! bot    -> bridge  {"op":"chat","message":"..."}
//! ```

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ProtocolError, Result};

/// Connection identity handed to the bridge when a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginOptions {
    /// Game server host.
    pub host: String,
    /// Game server port.
    pub port: u16,
    /// Account name the bot logs in as.
    pub username: String,
    /// Game protocol version string (e.g. `1.21.8`).
    pub version: String,
    /// Authentication mode (`microsoft`, `offline`, ...).
    pub auth: String,
}

/// Operation sent from the bot to the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum ClientOp {
    /// Open a game session.
    Login(LoginOptions),
    /// Send a chat line (or a slash command) as the bot.
    Chat {
        /// Raw text to send.
        message: String,
    },
    /// Leave the game and close the session.
    Quit,
}

impl ClientOp {
    /// Encode as a single JSON line (without the trailing newline).
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl FromStr for ClientOp {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProtocolError::EmptyLine);
        }
        Ok(serde_json::from_str(s)?)
    }
}

/// A position in the game world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// X coordinate.
    pub x: f64,
    /// Y coordinate.
    pub y: f64,
    /// Z coordinate.
    pub z: f64,
}

impl Position {
    /// Round every axis to two decimal places.
    pub fn rounded(self) -> Self {
        fn round2(v: f64) -> f64 {
            (v * 100.0).round() / 100.0
        }
        Self {
            x: round2(self.x),
            y: round2(self.y),
            z: round2(self.z),
        }
    }
}

/// Event emitted by the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ServerEvent {
    /// The bot entered the world; the session is usable.
    Spawn {
        /// Name the game server assigned to the bot, if reported.
        #[serde(default)]
        username: Option<String>,
    },
    /// A player chat line.
    Chat {
        /// Sender.
        username: String,
        /// Message body.
        message: String,
    },
    /// A system message rendered as plain text.
    #[serde(rename = "messagestr")]
    MessageStr {
        /// Rendered text.
        message: String,
    },
    /// The bot moved.
    Move {
        /// New position.
        position: Position,
        /// Current world name, if known.
        #[serde(default)]
        world: Option<String>,
    },
    /// A transport-level error. Does not by itself end the session.
    Error {
        /// Error description.
        message: String,
    },
    /// The session ended.
    End {
        /// Disconnect reason, if any.
        #[serde(default)]
        reason: Option<String>,
    },
}

impl ServerEvent {
    /// Encode as a single JSON line (without the trailing newline).
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl FromStr for ServerEvent {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProtocolError::EmptyLine);
        }
        Ok(serde_json::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_op_is_flat() {
        let op = ClientOp::Login(LoginOptions {
            host: "localhost".into(),
            port: 25565,
            username: "bot".into(),
            version: "1.21.8".into(),
            auth: "offline".into(),
        });
        let line = op.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["op"], "login");
        assert_eq!(value["host"], "localhost");
        assert_eq!(value["port"], 25565);
    }

    #[test]
    fn quit_op_has_only_tag() {
        assert_eq!(ClientOp::Quit.encode().unwrap(), r#"{"op":"quit"}"#);
    }

    #[test]
    fn parses_messagestr_event() {
        let event: ServerEvent = r#"{"event":"messagestr","message":"Steve 请求传送到你的位置"}"#
            .parse()
            .unwrap();
        assert_eq!(
            event,
            ServerEvent::MessageStr {
                message: "Steve 请求传送到你的位置".into()
            }
        );
    }

    #[test]
    fn optional_fields_default() {
        let spawn: ServerEvent = r#"{"event":"spawn"}"#.parse().unwrap();
        assert_eq!(spawn, ServerEvent::Spawn { username: None });

        let end: ServerEvent = r#"{"event":"end"}"#.parse().unwrap();
        assert_eq!(end, ServerEvent::End { reason: None });
    }

    #[test]
    fn rejects_unknown_event_and_blank_lines() {
        assert!(r#"{"event":"teleport"}"#.parse::<ServerEvent>().is_err());
        assert!(matches!(
            "   ".parse::<ServerEvent>(),
            Err(ProtocolError::EmptyLine)
        ));
    }

    #[test]
    fn position_rounds_to_two_places() {
        let p = Position {
            x: 1.23456,
            y: -64.005,
            z: 10.0,
        }
        .rounded();
        assert_eq!(p.x, 1.23);
        assert_eq!(p.z, 10.0);
        assert!((p.y - -64.0).abs() < 0.011);
    }
}
