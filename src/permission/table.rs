//! Permission table: groups, command requirements and plugin permissions.
//!
//! ```toml
//! [groups.everyone]
//! users = ["*"]
//! inherits = ["guest"]
//!
//! [groups.admin]
//! users = ["zhiyuHD"]
//! inherits = ["mod"]
//!
//! [commands]
//! run = "admin"
//!
//! [plugins.info]
//! private_lookup = "mod"
//! ```

use crate::error::PermissionConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{info, warn};

/// Member entry that matches every user.
pub const WILDCARD: &str = "*";

/// A named set of users plus the groups it inherits from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionGroup {
    /// Members; may contain [`WILDCARD`].
    #[serde(default, rename = "users", alias = "members")]
    pub members: BTreeSet<String>,
    /// Parent groups, checked in order.
    #[serde(default)]
    pub inherits: Vec<String>,
}

impl PermissionGroup {
    /// Whether `user` is listed explicitly.
    pub fn has_member(&self, user: &str) -> bool {
        self.members.contains(user)
    }

    /// Whether the group contains everyone.
    pub fn is_wildcard(&self) -> bool {
        self.members.contains(WILDCARD)
    }
}

/// Shared permission state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionTable {
    /// Groups by name.
    #[serde(default)]
    pub groups: BTreeMap<String, PermissionGroup>,
    /// Command name (case-folded) to required group.
    #[serde(default)]
    pub commands: BTreeMap<String, String>,
    /// Plugin name to permission name to required group.
    #[serde(default)]
    pub plugins: BTreeMap<String, BTreeMap<String, String>>,
}

impl PermissionTable {
    /// Parse a table from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        let mut table: PermissionTable = toml::from_str(text)?;
        table.commands = std::mem::take(&mut table.commands)
            .into_iter()
            .map(|(name, group)| (name.to_lowercase(), group))
            .collect();
        Ok(table)
    }

    /// Load a table from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PermissionConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                PermissionConfigError::NotFound(path.to_path_buf())
            } else {
                PermissionConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::from_toml(&text).map_err(|source| PermissionConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load a table, degrading to an empty (allow-everything) table on error.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(table) => {
                info!(
                    path = %path.display(),
                    groups = table.groups.len(),
                    commands = table.commands.len(),
                    "Loaded permission table"
                );
                table
            }
            Err(e) => {
                warn!(error = %e, "Permission table unavailable, every check will pass");
                Self::default()
            }
        }
    }

    /// Required group for a command, if any.
    pub fn command_requirement(&self, command: &str) -> Option<&str> {
        self.commands.get(&command.to_lowercase()).map(String::as_str)
    }

    /// Required group for a plugin permission, if any.
    pub fn custom_requirement(&self, plugin: &str, permission: &str) -> Option<&str> {
        self.plugins
            .get(plugin)
            .and_then(|perms| perms.get(permission))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_users_and_members_alias() {
        let table = PermissionTable::from_toml(
            r#"
            [groups.admin]
            users = ["alice"]
            inherits = ["mod"]

            [groups.mod]
            members = ["bob", "*"]

            [commands]
            Kick = "admin"

            [plugins.info]
            private_lookup = "mod"
            "#,
        )
        .unwrap();

        assert!(table.groups["admin"].has_member("alice"));
        assert_eq!(table.groups["admin"].inherits, vec!["mod"]);
        assert!(table.groups["mod"].has_member("bob"));
        assert!(table.groups["mod"].is_wildcard());
        assert_eq!(table.command_requirement("KICK"), Some("admin"));
        assert_eq!(table.custom_requirement("info", "private_lookup"), Some("mod"));
        assert_eq!(table.custom_requirement("info", "other"), None);
    }

    #[test]
    fn missing_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permissions.toml");
        assert!(matches!(
            PermissionTable::load(&path),
            Err(PermissionConfigError::NotFound(_))
        ));
        assert_eq!(PermissionTable::load_or_empty(&path), PermissionTable::default());
    }

    #[test]
    fn malformed_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permissions.toml");
        std::fs::write(&path, "[groups.admin\nusers = 3").unwrap();
        assert!(matches!(
            PermissionTable::load(&path),
            Err(PermissionConfigError::Parse { .. })
        ));
        assert!(PermissionTable::load_or_empty(&path).groups.is_empty());
    }
}
