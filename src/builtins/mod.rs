//! Plugins shipped with the bot.
//!
//! Every built-in is listed in [`catalog`]; a descriptor in the plugin
//! directory decides whether it actually loads.

mod base;
mod dice;
mod hitokoto;
mod info;
mod lock;
mod run;
mod status;
mod structure;
mod teleport;

pub use base::CorePlugin;
pub use dice::DicePlugin;
pub use hitokoto::HitokotoPlugin;
pub use info::InfoPlugin;
pub use lock::LockPlugin;
pub use run::RunPlugin;
pub use status::StatusPlugin;
pub use structure::StructurePlugin;
pub use teleport::TeleportPlugin;

use crate::plugin::{Plugin, PluginCatalog};
use std::sync::Arc;

/// Catalog of every built-in plugin, keyed by plugin name.
pub fn catalog() -> PluginCatalog {
    PluginCatalog::new()
        .with("core", || Arc::new(CorePlugin) as Arc<dyn Plugin>)
        .with("lock", || Arc::new(LockPlugin) as Arc<dyn Plugin>)
        .with("dice", || Arc::new(DicePlugin) as Arc<dyn Plugin>)
        .with("teleport", || Arc::new(TeleportPlugin) as Arc<dyn Plugin>)
        .with("status", || Arc::new(StatusPlugin) as Arc<dyn Plugin>)
        .with("run", || Arc::new(RunPlugin) as Arc<dyn Plugin>)
        .with("info", || Arc::new(InfoPlugin) as Arc<dyn Plugin>)
        .with("hitokoto", || Arc::new(HitokotoPlugin::new()) as Arc<dyn Plugin>)
        .with("structure", || Arc::new(StructurePlugin) as Arc<dyn Plugin>)
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::bot::BotHandle;
    use crate::config::Config;
    use crate::permission::PermissionResolver;
    use crate::plugin::{Plugin, PluginCatalog, PluginRegistry};
    use crate::supervisor::ConnectionSupervisor;
    use crate::transport::{MemoryBridge, MemoryConnector};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;
    use zybot_proto::{ClientOp, ConnectionState, ServerEvent};

    pub const OWNER: &str = "zhiyuHD";
    const WAIT: Duration = Duration::from_secs(3);

    /// A running bot wired to an in-memory bridge.
    pub struct Rig {
        pub bot: BotHandle,
        pub registry: PluginRegistry,
        pub bridge: MemoryBridge,
        /// Sessions opened by later reconnects.
        pub bridges: mpsc::UnboundedReceiver<MemoryBridge>,
    }

    pub async fn rig(plugin: Arc<dyn Plugin>) -> Rig {
        rig_with(Config::default(), plugin).await
    }

    pub async fn rig_with(config: Config, plugin: Arc<dyn Plugin>) -> Rig {
        let config = Arc::new(config);
        let (connector, mut bridges) = MemoryConnector::new();
        let supervisor = ConnectionSupervisor::new(
            Arc::new(connector),
            config.login_options(),
            config.reconnect.interval(),
        );
        let bot = BotHandle::new(config, supervisor);
        let registry = PluginRegistry::new(PermissionResolver::default(), PluginCatalog::new());
        registry.load(plugin, &bot).unwrap();

        bot.start().await;
        let bridge = bridges.recv().await.unwrap();
        assert!(bridge.emit(ServerEvent::Spawn { username: None }).await);

        let rig = Rig {
            bot,
            registry,
            bridge,
            bridges,
        };
        rig.wait_running().await;
        rig
    }

    impl Rig {
        pub async fn run(&self, user: &str, command: &str, args: &[&str]) -> bool {
            let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
            self.registry
                .execute_command(command, user, &args, &self.bot)
                .await
        }

        /// Chat lines already sent.
        pub fn chats(&mut self) -> Vec<String> {
            self.bridge
                .drain_ops()
                .into_iter()
                .filter_map(|op| match op {
                    ClientOp::Chat { message } => Some(message),
                    _ => None,
                })
                .collect()
        }

        /// Wait for the next chat line.
        pub async fn next_chat(&mut self) -> String {
            timeout(WAIT, self.bridge.next_chat())
                .await
                .expect("no chat line in time")
                .expect("bridge closed")
        }

        /// Wait until the supervisor reports `Running`.
        pub async fn wait_running(&self) {
            timeout(WAIT, async {
                while self.bot.supervisor().state() != ConnectionState::Running {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .expect("bot never reached running");
        }

        pub fn operate(&self, user: &str) {
            assert!(self.bot.select_bot(user, self.bot.bot_id()));
        }
    }

    /// Serve `router` on an ephemeral local port and return its base URL.
    pub async fn stub(router: axum::Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }
}
