//! Group-based permissions.
//!
//! - [`table`]: the on-disk table and its loader
//! - [`resolver`]: membership and inheritance checks
//!
//! Plugins only ever see a [`PermissionView`]; writes go through the
//! registration methods on the plugin context.

mod resolver;
mod table;

pub use resolver::PermissionResolver;
pub use table::{PermissionGroup, PermissionTable, WILDCARD};

/// Read-only handle on the permission state.
///
/// Has no way to add, change or remove entries.
#[derive(Debug, Clone)]
pub struct PermissionView {
    resolver: PermissionResolver,
}

impl PermissionView {
    pub(crate) fn new(resolver: PermissionResolver) -> Self {
        Self { resolver }
    }

    pub fn check_command_permission(&self, user: &str, command: &str) -> bool {
        self.resolver.check_command_permission(user, command)
    }

    pub fn check_custom_permission(&self, user: &str, plugin: &str, permission: &str) -> bool {
        self.resolver
            .check_custom_permission(user, plugin, permission)
    }

    pub fn check_permission(&self, user: &str, group: &str) -> bool {
        self.resolver.check_permission(user, group)
    }

    pub fn groups(&self) -> std::collections::BTreeMap<String, PermissionGroup> {
        self.resolver.groups()
    }
}

impl PermissionResolver {
    /// Query-only view for plugins.
    pub fn view(&self) -> PermissionView {
        PermissionView::new(self.clone())
    }
}
