//! Plugin descriptor files.
//!
//! One `*.toml` per plugin to load:
//!
//! ```toml
//! plugin = "dice"
//! enabled = true   # optional
//! ```
//!
//! Descriptors are processed in file-name order.

use crate::error::PluginError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PluginDescriptor {
    /// Catalog name of the plugin.
    pub plugin: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl PluginDescriptor {
    pub fn load(path: &Path) -> Result<Self, PluginError> {
        let text = std::fs::read_to_string(path).map_err(|e| PluginError::Descriptor {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| PluginError::Descriptor {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

/// A descriptor path and its parse result.
pub type DiscoveredDescriptor = (PathBuf, Result<PluginDescriptor, PluginError>);

/// List every descriptor in `dir`, sorted by file name.
///
/// Fails only if the directory itself cannot be read; individual bad files
/// are returned as errors next to their path.
pub fn discover(dir: &Path) -> Result<Vec<DiscoveredDescriptor>, PluginError> {
    if !dir.is_dir() {
        return Err(PluginError::Directory {
            path: dir.to_path_buf(),
            reason: "not a directory".to_string(),
        });
    }

    let pattern = format!(
        "{}/*.toml",
        glob::Pattern::escape(&dir.to_string_lossy())
    );
    let entries = glob::glob(&pattern).map_err(|e| PluginError::Directory {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "Skipping unreadable plugin descriptor");
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|path| {
            let descriptor = PluginDescriptor::load(&path);
            (path, descriptor)
        })
        .collect())
}
