//! Integration test common infrastructure.
//!
//! Spins up a fake game bridge on a loopback port and a [`PluginHost`]
//! wired to it through the real TCP connector.

pub mod bridge;

#[allow(unused_imports)]
pub use bridge::{BridgeClient, FakeBridge};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use zybot::config::Config;
use zybot::transport::BridgeConnector;
use zybot::{PluginHost, builtins};
use zybot_proto::ConnectionState;

/// Name the owner check recognizes by default.
#[allow(dead_code)]
pub const OWNER: &str = "zhiyuHD";

/// Config pointing at `bridge`, with descriptors and permissions under `dir`.
#[allow(dead_code)]
pub fn config_for(bridge: &FakeBridge, dir: &Path) -> Config {
    let mut config = Config::default();
    config.bridge.address = bridge.address();
    config.reconnect.interval_secs = 1;
    config.web.enabled = false;
    config.config_dir = dir.to_path_buf();
    config.plugins.directory = dir.join("plugins").display().to_string();
    config
}

/// Write one descriptor per plugin name into `<dir>/plugins`.
#[allow(dead_code)]
pub fn write_descriptors(dir: &Path, plugins: &[&str]) -> anyhow::Result<()> {
    let plugins_dir = dir.join("plugins");
    std::fs::create_dir_all(&plugins_dir)?;
    for (i, name) in plugins.iter().enumerate() {
        std::fs::write(
            plugins_dir.join(format!("{:02}-{name}.toml", (i + 1) * 10)),
            format!("plugin = \"{name}\"\n"),
        )?;
    }
    Ok(())
}

/// Build a host over the real bridge connector with the builtin catalog.
#[allow(dead_code)]
pub fn host(config: Config) -> PluginHost {
    let connector = Arc::new(
        BridgeConnector::new(config.bridge.address.clone())
            .with_connect_timeout(config.bridge.connect_timeout()),
    );
    PluginHost::new(config, connector, builtins::catalog())
}

/// Poll until the supervisor reports `state`.
#[allow(dead_code)]
pub async fn wait_for_state(host: &PluginHost, state: ConnectionState) -> anyhow::Result<()> {
    tokio::time::timeout(Duration::from_secs(5), async {
        while host.bot().supervisor().state() != state {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .map_err(|_| anyhow::anyhow!("timed out waiting for {state:?}"))
}
