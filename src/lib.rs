//! ZyBot - a plugin-driven chat command bot for Minecraft servers.
//!
//! The bot talks to the game through an external bridge process (see
//! [`transport`]), turns player chat lines into commands and runs them
//! through plugins under a group-based permission model.
//!
//! ```text
//! ConnectionSupervisor --ready--> CommandDispatcher --> PluginRegistry --> CommandHandler
//!         ^                                                   |
//!         +---------------------- chat -----------------------+
//! ```
//!
//! [`host::PluginHost`] wires all of it together.

pub mod bot;
pub mod builtins;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod host;
pub mod http;
pub mod permission;
pub mod plugin;
pub mod supervisor;
pub mod telemetry;
pub mod transport;

pub use bot::BotHandle;
pub use config::Config;
pub use dispatch::CommandDispatcher;
pub use host::PluginHost;
pub use permission::{PermissionResolver, PermissionView};
pub use plugin::{Plugin, PluginRegistry};
pub use supervisor::ConnectionSupervisor;
