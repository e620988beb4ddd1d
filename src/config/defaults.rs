//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse. The connection
//! identity defaults are what the bot falls back to when no config file can be
//! read at all.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// Connection Defaults
// =============================================================================

pub fn default_host() -> String {
    "localhost".to_string()
}

pub fn default_port() -> u16 {
    25565
}

pub fn default_username() -> String {
    "Fumumi_39".to_string()
}

pub fn default_version() -> String {
    "1.21.8".to_string()
}

pub fn default_auth() -> String {
    "microsoft".to_string()
}

pub fn default_config_dir() -> std::path::PathBuf {
    std::path::PathBuf::from("config")
}

// =============================================================================
// Identity Defaults ([main])
// =============================================================================

pub fn default_bot_id() -> String {
    "zy".to_string()
}

pub fn default_map_type() -> String {
    "BlueMap".to_string()
}

pub fn default_map_url() -> String {
    "https://map.example.com".to_string()
}

pub fn default_owner() -> String {
    "zhiyuHD".to_string()
}

// =============================================================================
// Bridge / Reconnect Defaults
// =============================================================================

pub fn default_bridge_address() -> String {
    "127.0.0.1:25580".to_string()
}

pub fn default_bridge_connect_timeout_secs() -> u64 {
    10
}

pub fn default_reconnect_interval_secs() -> u64 {
    60
}

// =============================================================================
// Command Defaults
// =============================================================================

pub fn default_prefix() -> String {
    zybot_proto::DEFAULT_PREFIX.to_string()
}

pub fn default_teleport_pattern() -> String {
    "请求传送到你的位置".to_string()
}

pub fn default_plugins_dir() -> String {
    "plugins".to_string()
}

pub fn default_permissions_file() -> String {
    "permissions.toml".to_string()
}

// =============================================================================
// Web Defaults
// =============================================================================

pub fn default_web_address() -> String {
    "0.0.0.0:3000".to_string()
}

pub fn default_static_dir() -> String {
    "static".to_string()
}

pub fn default_broadcast_interval_ms() -> u64 {
    2000
}

// =============================================================================
// Lookup Defaults
// =============================================================================

pub fn default_hitokoto_url() -> String {
    "https://v1.hitokoto.cn".to_string()
}

pub fn default_structure_url() -> String {
    "http://localhost:8080/locate".to_string()
}

pub fn default_mojang_profile_url() -> String {
    "https://api.mojang.com/users/profiles/minecraft".to_string()
}

pub fn default_mojang_session_url() -> String {
    "https://sessionserver.mojang.com/session/minecraft/profile".to_string()
}

pub fn default_lookup_timeout_secs() -> u64 {
    10
}
