//! Unified error handling for zybot.
//!
//! One error enum per concern. Only the binary edge and the composition root
//! reach for `anyhow`.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Errors loading the bot configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("config has the wrong shape: {0}")]
    Shape(#[source] serde_json::Error),
}

/// Errors loading the permission table.
#[derive(Debug, Error)]
pub enum PermissionConfigError {
    #[error("permission file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid permission file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ============================================================================
// Plugin Errors (load / activation)
// ============================================================================

/// Errors raised while loading or activating a plugin.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin has no name")]
    MissingName,

    #[error("plugin {0} is already loaded")]
    AlreadyLoaded(String),

    #[error("no plugin named {0} in the catalog")]
    UnknownPlugin(String),

    #[error("plugin directory {path} is unreadable: {reason}")]
    Directory { path: PathBuf, reason: String },

    #[error("invalid plugin descriptor {path}: {reason}")]
    Descriptor { path: PathBuf, reason: String },

    #[error("activation failed: {0}")]
    Activation(String),
}

// ============================================================================
// Handler Errors (command processing)
// ============================================================================

/// Errors a command handler may return.
///
/// Any of these is surfaced to the player as the generic invalid-command line.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Get a static error code string for log labelling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type for command handlers.
pub type HandlerResult = Result<(), HandlerError>;

// ============================================================================
// Transport Errors (game bridge)
// ============================================================================

/// Errors talking to the game bridge.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to bridge at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("timed out connecting to bridge at {addr} after {after:?}")]
    ConnectTimeout {
        addr: String,
        after: std::time::Duration,
    },

    #[error("bridge protocol error: {0}")]
    Protocol(#[from] zybot_proto::ProtocolError),

    #[error("bridge stream error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),

    #[error("transport closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_error_codes_are_stable() {
        assert_eq!(
            HandlerError::InvalidArgument("x".into()).error_code(),
            "invalid_argument"
        );
        assert_eq!(
            HandlerError::Internal("boom".into()).error_code(),
            "internal_error"
        );
    }

    #[test]
    fn plugin_error_messages_name_the_plugin() {
        let err = PluginError::AlreadyLoaded("dice".into());
        assert_eq!(err.to_string(), "plugin dice is already loaded");
    }
}
