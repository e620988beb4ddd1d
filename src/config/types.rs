//! Core configuration types.

use super::defaults::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use zybot_proto::LoginOptions;

/// Bot configuration.
///
/// The connection identity sits at the top level; everything else lives in
/// its own table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Game server host.
    #[serde(default = "default_host")]
    pub host: String,
    /// Game server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Account name the bot logs in as.
    #[serde(default = "default_username")]
    pub username: String,
    /// Game protocol version.
    #[serde(default = "default_version")]
    pub version: String,
    /// Authentication mode passed to the bridge.
    #[serde(default = "default_auth")]
    pub auth: String,
    /// Bot identity and map integration.
    #[serde(default)]
    pub main: MainConfig,
    /// Game bridge endpoint.
    #[serde(default)]
    pub bridge: BridgeConfig,
    /// Reconnect policy.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// Chat command recognition.
    #[serde(default)]
    pub commands: CommandsConfig,
    /// Plugin discovery.
    #[serde(default)]
    pub plugins: PluginsConfig,
    /// Permission table location.
    #[serde(default)]
    pub permissions: PermissionsConfig,
    /// Status server.
    #[serde(default)]
    pub web: WebConfig,
    /// Outbound lookup endpoints used by plugins.
    #[serde(default)]
    pub lookups: LookupConfig,
    /// Directory the config was loaded from. Relative paths resolve against it.
    #[serde(skip, default = "default_config_dir")]
    pub config_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_username(),
            version: default_version(),
            auth: default_auth(),
            main: MainConfig::default(),
            bridge: BridgeConfig::default(),
            reconnect: ReconnectConfig::default(),
            commands: CommandsConfig::default(),
            plugins: PluginsConfig::default(),
            permissions: PermissionsConfig::default(),
            web: WebConfig::default(),
            lookups: LookupConfig::default(),
            config_dir: default_config_dir(),
        }
    }
}

impl Config {
    /// Login identity handed to the bridge.
    pub fn login_options(&self) -> LoginOptions {
        LoginOptions {
            host: self.host.clone(),
            port: self.port,
            username: self.username.clone(),
            version: self.version.clone(),
            auth: self.auth.clone(),
        }
    }

    /// `host:port` label of the game server.
    pub fn server_label(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Permission file path, resolved against the config directory.
    pub fn permissions_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.permissions.file);
        if path.is_absolute() {
            path
        } else {
            self.config_dir.join(path)
        }
    }
}

/// `[main]` - who this bot is and who owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MainConfig {
    /// Id players use with `set-bot` to select this bot.
    #[serde(default = "default_bot_id")]
    pub bot_id: String,
    /// Web map flavour (only `BlueMap` supports position lookups).
    #[serde(default = "default_map_type")]
    pub map_type: String,
    /// Web map base URL.
    #[serde(default = "default_map_url")]
    pub map_url: String,
    /// Player with full control over the bot.
    #[serde(default = "default_owner")]
    pub owner: String,
}

impl Default for MainConfig {
    fn default() -> Self {
        Self {
            bot_id: default_bot_id(),
            map_type: default_map_type(),
            map_url: default_map_url(),
            owner: default_owner(),
        }
    }
}

/// `[bridge]` - where the game bridge listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_bridge_address")]
    pub address: String,
    /// How long a TCP connect to the bridge may take.
    #[serde(default = "default_bridge_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            address: default_bridge_address(),
            connect_timeout_secs: default_bridge_connect_timeout_secs(),
        }
    }
}

impl BridgeConfig {
    /// Never below one second.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs.max(1))
    }
}

/// `[reconnect]` - fixed-interval retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default = "default_reconnect_interval_secs")]
    pub interval_secs: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_reconnect_interval_secs(),
        }
    }
}

impl ReconnectConfig {
    /// Never below one second, so a zero in the file cannot spin.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// `[commands]` - chat command recognition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Prefix every command line starts with.
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Regex matched against system messages to auto-accept teleport requests.
    #[serde(default = "default_teleport_pattern")]
    pub teleport_pattern: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            teleport_pattern: default_teleport_pattern(),
        }
    }
}

/// `[plugins]` - descriptor directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginsConfig {
    #[serde(default = "default_plugins_dir")]
    pub directory: String,
}

impl Default for PluginsConfig {
    fn default() -> Self {
        Self {
            directory: default_plugins_dir(),
        }
    }
}

/// `[permissions]` - permission table file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    #[serde(default = "default_permissions_file")]
    pub file: String,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            file: default_permissions_file(),
        }
    }
}

/// Floor for the status feed period.
pub const MIN_BROADCAST_INTERVAL_MS: u64 = 100;

/// `[web]` - status server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_web_address")]
    pub address: String,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    #[serde(default = "default_broadcast_interval_ms")]
    pub broadcast_interval_ms: u64,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            address: default_web_address(),
            static_dir: default_static_dir(),
            broadcast_interval_ms: default_broadcast_interval_ms(),
        }
    }
}

impl WebConfig {
    /// Never below [`MIN_BROADCAST_INTERVAL_MS`].
    pub fn broadcast_interval(&self) -> Duration {
        Duration::from_millis(self.broadcast_interval_ms.max(MIN_BROADCAST_INTERVAL_MS))
    }
}

/// `[lookups]` - HTTP endpoints plugins query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    #[serde(default = "default_hitokoto_url")]
    pub hitokoto_url: String,
    #[serde(default = "default_structure_url")]
    pub structure_url: String,
    #[serde(default = "default_mojang_profile_url")]
    pub mojang_profile_url: String,
    #[serde(default = "default_mojang_session_url")]
    pub mojang_session_url: String,
    #[serde(default = "default_lookup_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            hitokoto_url: default_hitokoto_url(),
            structure_url: default_structure_url(),
            mojang_profile_url: default_mojang_profile_url(),
            mojang_session_url: default_mojang_session_url(),
            timeout_secs: default_lookup_timeout_secs(),
        }
    }
}

impl LookupConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
