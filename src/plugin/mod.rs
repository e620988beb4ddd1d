//! Plugin runtime.
//!
//! Plugins are compiled into the binary and listed in a [`PluginCatalog`].
//! Which ones actually load is decided by descriptor files in the plugin
//! directory (see [`descriptor`]). On activation a plugin gets a
//! [`PluginContext`] through which it registers commands, permissions and
//! ready callbacks.
//!
//! ## Handler shape
//!
//! Command handlers implement [`CommandHandler`] and receive a [`Context`]
//! carrying the caller, the arguments and the [`BotHandle`](crate::bot::BotHandle).

mod catalog;
mod context;
pub mod descriptor;
mod registry;

pub use catalog::PluginCatalog;
pub use context::PluginContext;
pub use descriptor::PluginDescriptor;
pub use registry::{
    CommandEntry, CommandHandler, CommandInfo, CommandListing, CommandSpec, Context, LoadSummary,
    PluginRegistry,
};

use crate::error::PluginError;
use serde::Serialize;

/// A unit of bot functionality.
pub trait Plugin: Send + Sync {
    /// Unique name. Also the key in descriptor files.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn version(&self) -> &str {
        "0.0.0"
    }

    /// Called once when the plugin loads. Register everything here.
    ///
    /// On error, every command this plugin registered is rolled back.
    fn activate(&self, ctx: &mut PluginContext<'_>) -> Result<(), PluginError>;

    /// Called on unload, before the plugin's commands are removed.
    fn deactivate(&self) {}
}

/// Metadata of a loaded plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PluginInfo {
    pub name: String,
    pub description: String,
    pub version: String,
}
