//! Group-based permission resolution.

use super::table::{PermissionGroup, PermissionTable};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Answers "may user U do X?" against the shared [`PermissionTable`].
///
/// Anything without a configured requirement is allowed. Cloning shares the
/// underlying table.
#[derive(Debug, Clone, Default)]
pub struct PermissionResolver {
    table: Arc<RwLock<PermissionTable>>,
}

impl PermissionResolver {
    pub fn new(table: PermissionTable) -> Self {
        Self {
            table: Arc::new(RwLock::new(table)),
        }
    }

    /// Whether `user` may run `command`.
    pub fn check_command_permission(&self, user: &str, command: &str) -> bool {
        let table = self.table.read();
        match table.command_requirement(command) {
            Some(group) => check_group(&table, user, group),
            None => {
                debug!(command, "No permission requirement, allowing");
                true
            }
        }
    }

    /// Whether `user` holds `plugin.permission`.
    pub fn check_custom_permission(&self, user: &str, plugin: &str, permission: &str) -> bool {
        let table = self.table.read();
        match table.custom_requirement(plugin, permission) {
            Some(group) => check_group(&table, user, group),
            None => {
                debug!(plugin, permission, "No permission requirement, allowing");
                true
            }
        }
    }

    /// Whether `user` belongs to `group`, directly or through inheritance.
    pub fn check_permission(&self, user: &str, group: &str) -> bool {
        check_group(&self.table.read(), user, group)
    }

    /// Require `group` for `command`. Overwrites an existing requirement.
    pub fn register_command_permission(&self, command: &str, group: &str) {
        let command = command.to_lowercase();
        debug!(command = %command, group, "Registered command permission");
        self.table
            .write()
            .commands
            .insert(command, group.to_string());
    }

    /// Require `group` for `plugin.permission`.
    pub fn register_custom_permission(&self, plugin: &str, permission: &str, group: &str) {
        debug!(plugin, permission, group, "Registered custom permission");
        self.table
            .write()
            .plugins
            .entry(plugin.to_string())
            .or_default()
            .insert(permission.to_string(), group.to_string());
    }

    /// Snapshot of all groups.
    pub fn groups(&self) -> BTreeMap<String, PermissionGroup> {
        self.table.read().groups.clone()
    }

    /// Snapshot of all plugin permission requirements.
    pub fn custom_permissions(&self) -> BTreeMap<String, BTreeMap<String, String>> {
        self.table.read().plugins.clone()
    }

    /// Required group for `command`, if any.
    pub fn command_requirement(&self, command: &str) -> Option<String> {
        self.table
            .read()
            .command_requirement(command)
            .map(str::to_string)
    }
}

/// Membership test: explicit groups first, then wildcard groups.
fn check_group(table: &PermissionTable, user: &str, required: &str) -> bool {
    let explicit = table.groups.iter().filter(|(_, g)| g.has_member(user));
    let wildcard = table
        .groups
        .iter()
        .filter(|(_, g)| g.is_wildcard() && !g.has_member(user));

    for (name, _) in explicit.chain(wildcard) {
        if name == required {
            return true;
        }
        let mut path = HashSet::new();
        path.insert(name.as_str());
        if inherits_from(table, name, required, &mut path) {
            return true;
        }
    }
    false
}

/// Depth-first walk of `group`'s inheritance chain.
///
/// `path` holds the groups on the current branch; revisiting one means the
/// configuration is cyclic and that branch resolves to `false`.
fn inherits_from<'a>(
    table: &'a PermissionTable,
    group: &str,
    required: &str,
    path: &mut HashSet<&'a str>,
) -> bool {
    let Some(entry) = table.groups.get(group) else {
        return false;
    };

    for parent in &entry.inherits {
        if parent == required {
            return true;
        }
        if !path.insert(parent.as_str()) {
            warn!(group, parent = %parent, "Cyclic group inheritance in permission config");
            continue;
        }
        let found = inherits_from(table, parent, required, path);
        path.remove(parent.as_str());
        if found {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver(toml: &str) -> PermissionResolver {
        PermissionResolver::new(PermissionTable::from_toml(toml).unwrap())
    }

    #[test]
    fn unconfigured_command_is_allowed_for_everyone() {
        let r = resolver("");
        assert!(r.check_command_permission("anyone", "ping"));
        assert!(r.check_custom_permission("anyone", "info", "lookup"));
    }

    #[test]
    fn direct_member_passes() {
        let r = resolver(
            r#"
            [groups.mod]
            users = ["alice"]
            [commands]
            kick = "mod"
            "#,
        );
        assert!(r.check_command_permission("alice", "kick"));
        assert!(!r.check_command_permission("bob", "kick"));
    }

    #[test]
    fn inheritance_does_not_flow_upwards() {
        let r = resolver(
            r#"
            [groups.admin]
            inherits = ["mod"]
            [groups.mod]
            users = ["alice"]
            [commands]
            kick = "admin"
            "#,
        );
        assert!(!r.check_command_permission("alice", "kick"));
    }

    #[test]
    fn transitive_inheritance_grants_parent_groups() {
        let r = resolver(
            r#"
            [groups.owner]
            users = ["zhiyuHD"]
            inherits = ["admin"]
            [groups.admin]
            inherits = ["mod"]
            [groups.mod]
            "#,
        );
        assert!(r.check_permission("zhiyuHD", "owner"));
        assert!(r.check_permission("zhiyuHD", "admin"));
        assert!(r.check_permission("zhiyuHD", "mod"));
        assert!(!r.check_permission("someone", "mod"));
    }

    #[test]
    fn wildcard_group_chain_applies_to_everyone() {
        let r = resolver(
            r#"
            [groups.everyone]
            users = ["*"]
            inherits = ["guest"]
            [groups.guest]
            [commands]
            ping = "guest"
            "#,
        );
        assert!(r.check_command_permission("random_player", "ping"));
        assert!(r.check_permission("random_player", "everyone"));
    }

    #[test]
    fn cyclic_inheritance_terminates_false() {
        let r = resolver(
            r#"
            [groups.a]
            users = ["alice"]
            inherits = ["b"]
            [groups.b]
            inherits = ["a"]
            [groups.c]
            "#,
        );
        assert!(!r.check_permission("alice", "c"));
        assert!(r.check_permission("alice", "b"));
    }

    #[test]
    fn diamond_inheritance_is_not_a_cycle() {
        let r = resolver(
            r#"
            [groups.top]
            users = ["alice"]
            inherits = ["left", "right"]
            [groups.left]
            inherits = ["base"]
            [groups.right]
            inherits = ["base"]
            [groups.base]
            inherits = ["root"]
            "#,
        );
        assert!(r.check_permission("alice", "root"));
    }

    #[test]
    fn missing_parent_contributes_nothing() {
        let r = resolver(
            r#"
            [groups.a]
            users = ["alice"]
            inherits = ["ghost"]
            "#,
        );
        assert!(r.check_permission("alice", "ghost"));
        assert!(!r.check_permission("alice", "other"));
    }

    #[test]
    fn registrations_are_shared_between_clones() {
        let r = resolver(
            r#"
            [groups.admin]
            users = ["alice"]
            "#,
        );
        let other = r.clone();
        other.register_command_permission("Run", "admin");
        other.register_custom_permission("info", "private_lookup", "admin");

        assert_eq!(r.command_requirement("run").as_deref(), Some("admin"));
        assert!(r.check_command_permission("alice", "run"));
        assert!(!r.check_command_permission("bob", "RUN"));
        assert!(!r.check_custom_permission("bob", "info", "private_lookup"));
        assert_eq!(r.custom_permissions()["info"]["private_lookup"], "admin");
        assert!(r.groups().contains_key("admin"));
    }
}
