//! Status snapshot pushed to status-feed subscribers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::bridge::Position;

/// Lifecycle state of the game connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    /// Not connected; a reconnect may be pending.
    #[default]
    Stopped,
    /// Connect requested, waiting for the session to become usable.
    Starting,
    /// Session is live; chat is delivered.
    Running,
    /// The transport reported an error.
    #[serde(rename = "error")]
    Errored,
}

impl ConnectionState {
    /// Wire name of the state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Errored => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the bot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Connection lifecycle state.
    pub connection_state: ConnectionState,
    /// Local time of the first start, formatted for humans.
    pub start_time: Option<String>,
    /// Seconds since the first start.
    pub uptime_seconds: f64,
    /// `host:port` of the game server.
    pub server: String,
    /// Configured bot account name.
    pub username: String,
    /// Whether the bot is locked.
    pub lock_state: bool,
    /// Reason given when locking.
    pub lock_reason: String,
    /// Who locked the bot.
    pub locked_by: String,
    /// Last known position.
    pub position: Position,
    /// Last known world name.
    pub world: String,
    /// Last recorded transport error.
    pub error_message: String,
    /// Reconnects attempted since the last successful connection.
    pub reconnect_attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errored_serializes_as_error() {
        let json = serde_json::to_string(&ConnectionState::Errored).unwrap();
        assert_eq!(json, r#""error""#);
        assert_eq!(ConnectionState::Errored.to_string(), "error");
    }

    #[test]
    fn snapshot_uses_camel_case_keys() {
        let snapshot = StatusSnapshot {
            connection_state: ConnectionState::Running,
            reconnect_attempts: 2,
            ..Default::default()
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["connectionState"], "running");
        assert_eq!(value["reconnectAttempts"], 2);
        assert!(value.get("lockReason").is_some());
    }
}
