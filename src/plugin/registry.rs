//! Plugin and command registry.

use super::descriptor;
use super::context::Staged;
use super::{Plugin, PluginCatalog, PluginContext, PluginInfo};
use crate::bot::BotHandle;
use crate::error::{HandlerResult, PluginError};
use crate::permission::{PermissionResolver, PermissionView};
use crate::supervisor::{ListenerKey, Session};
use crate::telemetry::{CommandTimer, spans};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{Instrument, debug, error, info, warn};

/// Handler context passed to each command handler.
pub struct Context<'a> {
    /// Player who issued the command.
    pub user: &'a str,
    /// Case-folded command name.
    pub command: &'a str,
    /// Positional arguments.
    pub args: &'a [String],
    pub bot: &'a BotHandle,
    pub commands: &'a CommandListing,
    pub permissions: &'a PermissionView,
}

impl Context<'_> {
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    /// Arguments joined with single spaces.
    pub fn joined_args(&self) -> String {
        self.args.join(" ")
    }

    /// Chat a line through the bot.
    pub fn reply(&self, message: impl Into<String>) -> bool {
        self.bot.chat(message)
    }
}

/// Trait implemented by all command handlers.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, ctx: &Context<'_>) -> HandlerResult;
}

/// How a command presents itself and who may run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    pub usage: String,
    pub required_group: Option<String>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            usage: name.clone(),
            name,
            description: String::new(),
            required_group: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Only members of `group` may run the command.
    pub fn requires(mut self, group: impl Into<String>) -> Self {
        self.required_group = Some(group.into());
        self
    }
}

/// A registered command.
#[derive(Clone)]
pub struct CommandEntry {
    pub name: String,
    pub handler: Arc<dyn CommandHandler>,
    pub description: String,
    pub usage: String,
    pub plugin: String,
    pub required_group: Option<String>,
}

/// Public view of a command, as listed by `help`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
    pub usage: String,
    pub plugin: String,
}

impl From<&CommandEntry> for CommandInfo {
    fn from(entry: &CommandEntry) -> Self {
        Self {
            name: entry.name.clone(),
            description: entry.description.clone(),
            usage: entry.usage.clone(),
            plugin: entry.plugin.clone(),
        }
    }
}

/// Read-only view of the command table.
///
/// Handlers get this instead of the registry, so nothing they run can
/// register, unload or change a permission requirement.
///
/// ```compile_fail
/// use zybot::plugin::CommandListing;
///
/// fn escalate(listing: &CommandListing) {
///     listing.registry.unload("core");
/// }
/// ```
#[derive(Clone)]
pub struct CommandListing {
    registry: PluginRegistry,
}

impl CommandListing {
    /// Every command, sorted by name.
    pub fn list(&self) -> Vec<CommandInfo> {
        self.registry.list_commands()
    }

    pub fn get(&self, name: &str) -> Option<CommandInfo> {
        self.registry.lookup(name).as_ref().map(CommandInfo::from)
    }
}

/// Outcome of loading a plugin directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: Vec<String>,
    pub disabled: Vec<String>,
    pub failed: Vec<String>,
}

struct LoadedPlugin {
    name: String,
    plugin: Arc<dyn Plugin>,
    /// Bot the plugin was activated against; its ready callbacks live there.
    bot: BotHandle,
}

struct RegistryInner {
    resolver: PermissionResolver,
    catalog: PluginCatalog,
    /// In load order.
    plugins: RwLock<Vec<LoadedPlugin>>,
    commands: RwLock<HashMap<String, CommandEntry>>,
}

/// Loaded plugins and the command table they populate.
///
/// Cloning shares the registry.
#[derive(Clone)]
pub struct PluginRegistry {
    inner: Arc<RegistryInner>,
}

impl PluginRegistry {
    pub fn new(resolver: PermissionResolver, catalog: PluginCatalog) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                resolver,
                catalog,
                plugins: RwLock::new(Vec::new()),
                commands: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub(crate) fn resolver(&self) -> &PermissionResolver {
        &self.inner.resolver
    }

    pub fn catalog(&self) -> &PluginCatalog {
        &self.inner.catalog
    }

    /// Query-only view handed to plugins and handlers.
    pub fn listing(&self) -> CommandListing {
        CommandListing {
            registry: self.clone(),
        }
    }

    /// Load every plugin named by a descriptor in `dir`.
    ///
    /// Failures are logged per descriptor; the rest keep loading.
    pub fn load_all(&self, dir: impl AsRef<Path>, bot: &BotHandle) -> LoadSummary {
        let dir = dir.as_ref();
        let mut summary = LoadSummary::default();

        let entries = match descriptor::discover(dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(error = %e, "Failed to read plugin directory");
                return summary;
            }
        };

        for (path, descriptor) in entries {
            let descriptor = match descriptor {
                Ok(d) => d,
                Err(e) => {
                    error!(error = %e, "Skipping plugin descriptor");
                    summary.failed.push(path.display().to_string());
                    continue;
                }
            };

            if !descriptor.enabled {
                debug!(plugin = %descriptor.plugin, "Plugin disabled by descriptor");
                summary.disabled.push(descriptor.plugin);
                continue;
            }

            let Some(plugin) = self.inner.catalog.create(&descriptor.plugin) else {
                let e = PluginError::UnknownPlugin(descriptor.plugin.clone());
                error!(path = %path.display(), error = %e, "Skipping plugin descriptor");
                summary.failed.push(descriptor.plugin);
                continue;
            };

            match self.load(plugin, bot) {
                Ok(()) => summary.loaded.push(descriptor.plugin),
                Err(_) => summary.failed.push(descriptor.plugin),
            }
        }

        info!(
            dir = %dir.display(),
            loaded = summary.loaded.len(),
            disabled = summary.disabled.len(),
            failed = summary.failed.len(),
            "Plugin loading complete"
        );
        summary
    }

    /// Activate and register a single plugin.
    ///
    /// First-loaded wins: a second plugin with the same name is refused.
    /// Registrations made during activation take effect only if it succeeds.
    pub fn load(&self, plugin: Arc<dyn Plugin>, bot: &BotHandle) -> Result<(), PluginError> {
        let name = plugin.name().trim().to_string();
        if name.is_empty() {
            error!("Plugin has no name, refusing to load");
            return Err(PluginError::MissingName);
        }
        if self.is_loaded(&name) {
            warn!(plugin = %name, "Plugin already loaded, skipping");
            return Err(PluginError::AlreadyLoaded(name));
        }

        let span = spans::plugin(&name);
        let _guard = span.enter();

        let mut ctx = PluginContext::new(&name, bot, self.inner.resolver.view(), self.listing());
        match plugin.activate(&mut ctx) {
            Ok(()) => {
                let commands = self.commit(&name, bot, ctx.into_staged());
                info!(
                    plugin = %name,
                    version = plugin.version(),
                    commands,
                    "Plugin loaded"
                );
                self.inner.plugins.write().push(LoadedPlugin {
                    name,
                    plugin,
                    bot: bot.clone(),
                });
                Ok(())
            }
            Err(e) => {
                let discarded = ctx.into_staged().commands.len();
                error!(plugin = %name, error = %e, discarded, "Plugin activation failed");
                Err(e)
            }
        }
    }

    /// Apply what `plugin` registered during activation. Returns the number
    /// of commands added.
    fn commit(&self, plugin: &str, bot: &BotHandle, staged: Staged) -> usize {
        let commands = staged.commands.len();
        for (spec, handler) in staged.commands {
            self.insert_command(spec, handler, plugin);
        }
        for (permission, group) in &staged.permissions {
            self.inner
                .resolver
                .register_custom_permission(plugin, permission, group);
        }
        for (name, callback) in staged.ready {
            bot.supervisor()
                .on_ready(ListenerKey::new(plugin, name), move |session: &Session| {
                    callback(session)
                });
        }
        commands
    }

    /// Deactivate a plugin and drop everything it registered.
    pub fn unload(&self, name: &str) -> bool {
        let loaded = {
            let plugins = self.inner.plugins.read();
            plugins
                .iter()
                .find(|p| p.name == name)
                .map(|p| (Arc::clone(&p.plugin), p.bot.clone()))
        };
        let Some((plugin, bot)) = loaded else {
            warn!(plugin = name, "Cannot unload unknown plugin");
            return false;
        };

        plugin.deactivate();
        let removed = self.remove_commands_of(name);
        bot.supervisor().remove_ready_callbacks(name);
        self.inner
            .plugins
            .write()
            .retain(|p| p.name != name);

        info!(plugin = name, commands = removed, "Plugin unloaded");
        true
    }

    /// Unload every plugin, most recently loaded first.
    pub fn unload_all(&self) {
        let names: Vec<String> = self
            .inner
            .plugins
            .read()
            .iter()
            .rev()
            .map(|p| p.name.clone())
            .collect();
        for name in names {
            self.unload(&name);
        }
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.inner
            .plugins
            .read()
            .iter()
            .any(|p| p.name == name)
    }

    /// Loaded plugins in load order.
    pub fn plugins(&self) -> Vec<PluginInfo> {
        self.inner
            .plugins
            .read()
            .iter()
            .map(|p| PluginInfo {
                name: p.name.clone(),
                description: p.plugin.description().to_string(),
                version: p.plugin.version().to_string(),
            })
            .collect()
    }

    /// Register a command. An existing command of the same name is replaced.
    pub fn register_command<H>(&self, spec: CommandSpec, handler: H, plugin: &str)
    where
        H: CommandHandler + 'static,
    {
        self.insert_command(spec, Arc::new(handler), plugin);
    }

    fn insert_command(&self, spec: CommandSpec, handler: Arc<dyn CommandHandler>, plugin: &str) {
        let name = spec.name.to_lowercase();
        if let Some(group) = &spec.required_group {
            self.inner.resolver.register_command_permission(&name, group);
        }

        let entry = CommandEntry {
            name: name.clone(),
            handler,
            description: spec.description,
            usage: spec.usage,
            plugin: plugin.to_string(),
            required_group: spec.required_group,
        };

        if let Some(previous) = self.inner.commands.write().insert(name.clone(), entry) {
            warn!(
                command = %name,
                previous = %previous.plugin,
                plugin,
                "Command already registered, overwriting"
            );
        } else {
            debug!(command = %name, plugin, "Registered command");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<CommandEntry> {
        self.inner.commands.read().get(&name.to_lowercase()).cloned()
    }

    /// Every command, sorted by name.
    pub fn list_commands(&self) -> Vec<CommandInfo> {
        let mut commands: Vec<CommandInfo> = self
            .inner
            .commands
            .read()
            .values()
            .map(CommandInfo::from)
            .collect();
        commands.sort_by(|a, b| a.name.cmp(&b.name));
        commands
    }

    /// Run a command on behalf of `user`.
    ///
    /// Returns `false` for unknown commands, permission denials and handler
    /// failures; `true` once the handler completed.
    pub async fn execute_command(
        &self,
        name: &str,
        user: &str,
        args: &[String],
        bot: &BotHandle,
    ) -> bool {
        let name = name.to_lowercase();
        let Some(entry) = self.lookup(&name) else {
            debug!(command = %name, user, "Unknown command");
            return false;
        };

        if !self.inner.resolver.check_command_permission(user, &name) {
            warn!(command = %name, user, "Permission denied");
            bot.chat(format!("{user} 你没有权限使用命令 {name}"));
            return false;
        }

        let permissions = self.inner.resolver.view();
        let commands = self.listing();
        let ctx = Context {
            user,
            command: &name,
            args,
            bot,
            commands: &commands,
            permissions: &permissions,
        };

        let _timer = CommandTimer::new(&name);
        let span = spans::command(&name, user);
        match entry.handler.handle(&ctx).instrument(span).await {
            Ok(()) => true,
            Err(e) => {
                error!(
                    command = %name,
                    user,
                    plugin = %entry.plugin,
                    code = e.error_code(),
                    error = %e,
                    "Command handler failed"
                );
                false
            }
        }
    }

    fn remove_commands_of(&self, plugin: &str) -> usize {
        let mut commands = self.inner.commands.write();
        let before = commands.len();
        commands.retain(|_, entry| entry.plugin != plugin);
        before - commands.len()
    }
}
