//! Chat line dispatch.
//!
//! Turns player chat into command executions and answers teleport requests.

use crate::bot::BotHandle;
use crate::config::CommandsConfig;
use crate::config::defaults::default_teleport_pattern;
use crate::plugin::PluginRegistry;
use crate::supervisor::{ListenerKey, Session, SessionListener};
use regex::Regex;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use zybot_proto::CommandLine;

/// Line sent back when a command is unknown, denied or failed.
pub const INVALID_COMMAND_MESSAGE: &str = "&#fb0808指&#fb3145令&#fc5b83错&#fc84c0误&#fcadfd！";

const OWNER: &str = "dispatcher";
const LISTENER: &str = "commands";

struct DispatcherInner {
    prefix: String,
    /// `None` only if even the default pattern failed to compile.
    teleport: Option<Regex>,
    registry: PluginRegistry,
    bot: BotHandle,
}

/// Routes chat lines to commands.
///
/// Cloning shares the dispatcher.
#[derive(Clone)]
pub struct CommandDispatcher {
    inner: Arc<DispatcherInner>,
}

impl CommandDispatcher {
    pub fn new(config: &CommandsConfig, registry: PluginRegistry, bot: BotHandle) -> Self {
        let teleport = match Regex::new(&config.teleport_pattern) {
            Ok(re) => Some(re),
            Err(e) => {
                warn!(
                    pattern = %config.teleport_pattern,
                    error = %e,
                    "Invalid teleport pattern, using default"
                );
                Regex::new(&regex::escape(&default_teleport_pattern())).ok()
            }
        };

        Self {
            inner: Arc::new(DispatcherInner {
                prefix: config.prefix.clone(),
                teleport,
                registry,
                bot,
            }),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.inner.prefix
    }

    /// Subscribe to every session the supervisor opens from now on.
    pub fn attach(&self) -> bool {
        let key = ListenerKey::new(OWNER, LISTENER);
        let dispatcher = self.clone();
        self.inner
            .bot
            .supervisor()
            .on_ready(key.clone(), move |session: &Session| {
                session.detach(&key);
                session.attach(key.clone(), Arc::new(dispatcher.clone()));
                debug!(generation = session.generation(), "Command listener attached");
                Ok(())
            })
    }

    /// Handle one chat line from `user`.
    ///
    /// Returns the spawned dispatch task, or `None` when the line is not a
    /// command or came from the bot itself.
    pub fn handle(&self, user: &str, raw: &str) -> Option<JoinHandle<bool>> {
        if user == self.inner.bot.username() {
            return None;
        }
        info!("[{user}] {raw}");

        let line = CommandLine::parse(&self.inner.prefix, raw)?;
        let dispatcher = self.clone();
        let user = user.to_string();
        Some(tokio::spawn(async move {
            dispatcher.dispatch(&user, line).await
        }))
    }

    /// Execute a parsed command, answering with the invalid-command line when
    /// it does not succeed.
    pub async fn dispatch(&self, user: &str, line: CommandLine) -> bool {
        let ok = self
            .inner
            .registry
            .execute_command(&line.name, user, &line.args, &self.inner.bot)
            .await;
        if !ok {
            debug!(command = %line.name, user, "Command did not succeed");
            self.inner.bot.chat(INVALID_COMMAND_MESSAGE);
        }
        ok
    }

    /// React to a system message. Returns whether a teleport request was accepted.
    pub fn handle_system_message(&self, message: &str) -> bool {
        debug!(message, "System message");
        let matched = self
            .inner
            .teleport
            .as_ref()
            .is_some_and(|re| re.is_match(message));
        if !matched {
            return false;
        }
        info!("Teleport request received, accepting");
        self.inner.bot.chat("等我一下！");
        self.inner.bot.chat("/tpaccept");
        true
    }
}

impl SessionListener for CommandDispatcher {
    fn on_chat(&self, _session: &Session, username: &str, message: &str) {
        self.handle(username, message);
    }

    fn on_system_message(&self, _session: &Session, message: &str) {
        self.handle_system_message(message);
    }
}
