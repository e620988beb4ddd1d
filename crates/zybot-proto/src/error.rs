//! Error types for the bridge protocol.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Errors produced while encoding or decoding bridge lines.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The line was empty or contained only whitespace.
    #[error("empty line")]
    EmptyLine,

    /// The line was not valid JSON for the expected shape.
    #[error("malformed bridge line: {0}")]
    Json(#[from] serde_json::Error),
}
