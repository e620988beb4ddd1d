//! Composition root.
//!
//! [`PluginHost`] owns one of everything: the permission table, the
//! supervisor, the bot handle, the plugin registry and the dispatcher.

use crate::bot::BotHandle;
use crate::config::Config;
use crate::dispatch::CommandDispatcher;
use crate::permission::{PermissionResolver, PermissionTable};
use crate::plugin::{LoadSummary, PluginCatalog, PluginRegistry};
use crate::supervisor::ConnectionSupervisor;
use crate::transport::Connector;
use std::sync::Arc;
use tracing::info;

pub struct PluginHost {
    bot: BotHandle,
    registry: PluginRegistry,
    dispatcher: CommandDispatcher,
}

impl PluginHost {
    /// Wire everything up. Nothing connects until [`start`](Self::start).
    pub fn new(config: Config, connector: Arc<dyn Connector>, catalog: PluginCatalog) -> Self {
        let config = Arc::new(config);
        let resolver = PermissionResolver::new(PermissionTable::load_or_empty(
            config.permissions_path(),
        ));

        let supervisor = ConnectionSupervisor::new(
            connector,
            config.login_options(),
            config.reconnect.interval(),
        );
        let bot = BotHandle::new(Arc::clone(&config), supervisor);
        let registry = PluginRegistry::new(resolver, catalog);
        let dispatcher = CommandDispatcher::new(&config.commands, registry.clone(), bot.clone());

        Self {
            bot,
            registry,
            dispatcher,
        }
    }

    /// Load plugins, subscribe the dispatcher and connect.
    pub async fn start(&self) -> LoadSummary {
        let config = self.bot.config();
        info!(
            server = %config.server_label(),
            username = %config.username,
            bot_id = %config.main.bot_id,
            "Starting ZyBot"
        );

        let summary = self
            .registry
            .load_all(&config.plugins.directory, &self.bot);
        self.dispatcher.attach();
        self.bot.start().await;
        summary
    }

    /// Leave the game and unload every plugin.
    pub fn shutdown(&self) {
        info!("Shutting down");
        self.bot.stop();
        self.registry.unload_all();
    }

    pub fn bot(&self) -> &BotHandle {
        &self.bot
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }
}
