//! # zybot-proto
//!
//! Wire-level types shared by the ZyBot runtime and the game bridge it talks to.
//!
//! ## Features
//!
//! - Chat command grammar (`<prefix> <command> [args...]`)
//! - Bridge protocol: JSON-lines ops sent to the game client and events received from it
//! - Status snapshot pushed to status-feed subscribers
//!
//! ## Quick Start
//!
//! ```rust
//! use zybot_proto::CommandLine;
//!
//! let line = CommandLine::parse(".zybot", ".zybot Lock  going afk").unwrap();
//! assert_eq!(line.name, "lock");
//! assert_eq!(line.args, vec!["going", "afk"]);
//! ```
//!
//! ```rust
//! use zybot_proto::ServerEvent;
//!
//! let event: ServerEvent = r#"{"event":"chat","username":"alice","message":"hi"}"#
//!     .parse()
//!     .unwrap();
//! assert!(matches!(event, ServerEvent::Chat { .. }));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod bridge;
pub mod command;
pub mod error;
pub mod status;

pub use bridge::{ClientOp, LoginOptions, Position, ServerEvent};
pub use command::{CommandLine, DEFAULT_PREFIX};
pub use error::{ProtocolError, Result};
pub use status::{ConnectionState, StatusSnapshot};
