use super::registry::{CommandHandler, CommandListing, CommandSpec};
use crate::bot::BotHandle;
use crate::permission::PermissionView;
use crate::supervisor::Session;
use std::sync::Arc;

pub(crate) type StagedCallback = Arc<dyn Fn(&Session) -> anyhow::Result<()> + Send + Sync>;

/// Registrations collected during activation.
///
/// The registry commits them only once `activate` returns `Ok`.
#[derive(Default)]
pub(crate) struct Staged {
    pub(crate) commands: Vec<(CommandSpec, Arc<dyn CommandHandler>)>,
    pub(crate) permissions: Vec<(String, String)>,
    pub(crate) ready: Vec<(String, StagedCallback)>,
}

/// What a plugin sees while it activates.
///
/// Everything registered here is attributed to the activating plugin.
pub struct PluginContext<'a> {
    plugin: &'a str,
    bot: &'a BotHandle,
    permissions: PermissionView,
    commands: CommandListing,
    staged: Staged,
}

impl<'a> PluginContext<'a> {
    pub(crate) fn new(
        plugin: &'a str,
        bot: &'a BotHandle,
        permissions: PermissionView,
        commands: CommandListing,
    ) -> Self {
        Self {
            plugin,
            bot,
            permissions,
            commands,
            staged: Staged::default(),
        }
    }

    pub fn plugin_name(&self) -> &str {
        self.plugin
    }

    pub fn bot(&self) -> &BotHandle {
        self.bot
    }

    /// Commands registered so far by other plugins.
    pub fn commands(&self) -> &CommandListing {
        &self.commands
    }

    /// Query-only access to the permission table.
    pub fn permissions(&self) -> &PermissionView {
        &self.permissions
    }

    /// `<prefix> <rest>`, for usage strings.
    pub fn usage(&self, rest: &str) -> String {
        format!("{} {}", self.bot.config().commands.prefix, rest)
    }

    /// Register a command owned by this plugin.
    pub fn register_command<H>(&mut self, spec: CommandSpec, handler: H)
    where
        H: CommandHandler + 'static,
    {
        self.staged.commands.push((spec, Arc::new(handler)));
    }

    /// Require `group` for this plugin's `permission`.
    pub fn register_permission(&mut self, permission: &str, group: &str) {
        self.staged
            .permissions
            .push((permission.to_string(), group.to_string()));
    }

    /// Run `callback` on every successful (re)connection.
    ///
    /// `name` distinguishes several callbacks of the same plugin. Returns
    /// false if this plugin already registered `name`.
    pub fn on_ready<F>(&mut self, name: &str, callback: F) -> bool
    where
        F: Fn(&Session) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        if self.staged.ready.iter().any(|(n, _)| n == name) {
            return false;
        }
        self.staged.ready.push((name.to_string(), Arc::new(callback)));
        true
    }

    pub(crate) fn into_staged(self) -> Staged {
        self.staged
    }
}
