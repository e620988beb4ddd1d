//! Configuration loading and management.
//!
//! The bot reads two optional files from its config directory:
//! - `config.json`: base layer
//! - `config.toml`: overrides, top-level keys win over the JSON layer
//!
//! The merge is shallow: a table present in `config.toml` replaces the whole
//! table from `config.json`, and missing fields fall back to [`defaults`].
//!
//! Submodules:
//! - [`types`]: Core config struct definitions
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup sanity checks

pub(crate) mod defaults;
mod types;
mod validation;

pub use types::{
    BridgeConfig, CommandsConfig, Config, LookupConfig, MIN_BROADCAST_INTERVAL_MS, MainConfig,
    PermissionsConfig, PluginsConfig, ReconnectConfig, WebConfig,
};
pub use validation::{ValidationError, validate};

use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{debug, warn};

/// File name of the JSON base layer.
pub const JSON_CONFIG: &str = "config.json";
/// File name of the TOML override layer.
pub const TOML_CONFIG: &str = "config.toml";

impl Config {
    /// Load configuration from a directory.
    ///
    /// Missing files are skipped. If neither exists the defaults are used.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let dir = dir.as_ref();
        let mut merged = Map::new();
        let mut found = false;

        if let Some(json) = read_json_layer(&dir.join(JSON_CONFIG))? {
            merge_shallow(&mut merged, json);
            found = true;
        }
        if let Some(toml) = read_toml_layer(&dir.join(TOML_CONFIG))? {
            merge_shallow(&mut merged, toml);
            found = true;
        }

        if !found {
            warn!(dir = %dir.display(), "No config files found, using defaults");
        }

        let mut config: Config =
            serde_json::from_value(Value::Object(merged)).map_err(ConfigError::Shape)?;
        config.config_dir = dir.to_path_buf();
        Ok(config)
    }

    /// Load configuration, falling back to the defaults on any error.
    pub fn load_or_default(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        match Self::load(dir) {
            Ok(config) => config,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "Failed to load config, using defaults");
                Self {
                    config_dir: dir.to_path_buf(),
                    ..Self::default()
                }
            }
        }
    }
}

fn read_json_layer(path: &Path) -> Result<Option<Map<String, Value>>, ConfigError> {
    let Some(text) = read_optional(path)? else {
        return Ok(None);
    };
    let value: Value = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(into_object(value)))
}

fn read_toml_layer(path: &Path) -> Result<Option<Map<String, Value>>, ConfigError> {
    let Some(text) = read_optional(path)? else {
        return Ok(None);
    };
    let value: Value = toml::from_str(&text).map_err(|source| ConfigError::Toml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(into_object(value)))
}

fn read_optional(path: &Path) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            debug!(path = %path.display(), "Read config layer");
            Ok(Some(text))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn into_object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn merge_shallow(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_dir_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("nope")).unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 25565);
        assert_eq!(config.username, "Fumumi_39");
        assert_eq!(config.version, "1.21.8");
        assert_eq!(config.auth, "microsoft");
        assert_eq!(config.main.bot_id, "zy");
        assert_eq!(config.main.owner, "zhiyuHD");
        assert_eq!(config.main.map_type, "BlueMap");
    }

    #[test]
    fn toml_layer_wins_over_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(JSON_CONFIG),
            r#"{"host":"json.example","port":1111,"username":"json_bot"}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join(TOML_CONFIG),
            "host = \"toml.example\"\n[main]\nbot_id = \"b2\"\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.host, "toml.example");
        assert_eq!(config.port, 1111);
        assert_eq!(config.username, "json_bot");
        assert_eq!(config.main.bot_id, "b2");
        // Table replaced wholesale, remaining fields defaulted.
        assert_eq!(config.main.owner, "zhiyuHD");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(TOML_CONFIG), "host = [unterminated").unwrap();

        assert!(matches!(
            Config::load(dir.path()),
            Err(ConfigError::Toml { .. })
        ));

        let config = Config::load_or_default(dir.path());
        assert_eq!(config.host, "localhost");
        assert_eq!(config.config_dir, dir.path());
    }

    #[test]
    fn wrong_shape_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(JSON_CONFIG), r#"{"port":"not a number"}"#).unwrap();
        assert!(matches!(Config::load(dir.path()), Err(ConfigError::Shape(_))));
    }

    #[test]
    fn permissions_path_is_relative_to_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.permissions_path(), dir.path().join("permissions.toml"));
    }
}
