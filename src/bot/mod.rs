//! The bot handle handed to plugins and command handlers.

mod lock;

pub use lock::{LockOutcome, LockState, UnlockOutcome};

use crate::config::Config;
use crate::supervisor::ConnectionSupervisor;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use zybot_proto::StatusSnapshot;

/// Shared bot state that survives reconnects.
struct BotState {
    config: Arc<Config>,
    lock: Mutex<LockState>,
    /// Player -> bot id they last selected with `set-bot`.
    operators: DashMap<String, String>,
    http: reqwest::Client,
}

/// Handle on the running bot.
///
/// Wraps the connection supervisor and the state plugins share. Cheap to clone.
#[derive(Clone)]
pub struct BotHandle {
    supervisor: ConnectionSupervisor,
    state: Arc<BotState>,
}

impl BotHandle {
    pub fn new(config: Arc<Config>, supervisor: ConnectionSupervisor) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.lookups.timeout())
            .user_agent(concat!("zybot/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Failed to build HTTP client, using defaults");
                reqwest::Client::new()
            });

        Self {
            supervisor,
            state: Arc::new(BotState {
                config,
                lock: Mutex::new(LockState::default()),
                operators: DashMap::new(),
                http,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.state.config
    }

    pub fn supervisor(&self) -> &ConnectionSupervisor {
        &self.supervisor
    }

    /// Shared HTTP client for outbound lookups.
    pub fn http(&self) -> &reqwest::Client {
        &self.state.http
    }

    /// Send a chat line. No-op unless the bot is running.
    pub fn chat(&self, message: impl Into<String>) -> bool {
        self.supervisor.chat(message)
    }

    /// Name the bot is known by in game.
    pub fn username(&self) -> String {
        self.supervisor.username()
    }

    pub fn bot_id(&self) -> &str {
        &self.state.config.main.bot_id
    }

    pub fn is_owner(&self, user: &str) -> bool {
        user == self.state.config.main.owner
    }

    /// Whether `user` currently operates this bot (selected it, or owns it).
    pub fn is_operator(&self, user: &str) -> bool {
        self.state.operators.contains_key(user) || self.is_owner(user)
    }

    /// Record `user` selecting bot `bot_id`. Returns whether that is this bot.
    pub fn select_bot(&self, user: &str, bot_id: &str) -> bool {
        if bot_id == self.bot_id() {
            self.state
                .operators
                .insert(user.to_string(), bot_id.to_string());
            debug!(user, bot_id, "Player selected this bot");
            true
        } else {
            self.state.operators.remove(user);
            debug!(user, bot_id, "Player selected another bot");
            false
        }
    }

    /// Run `f` with the lock state held. Must not await inside.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut LockState) -> R) -> R {
        f(&mut self.state.lock.lock())
    }

    pub fn lock_state(&self) -> LockState {
        self.state.lock.lock().clone()
    }

    /// Connect to the game. The lock is reset only on a fresh start, not on
    /// reconnects.
    pub async fn start(&self) {
        if self.supervisor.reconnect_attempts() == 0 {
            self.state.lock.lock().reset();
        }
        self.supervisor.start().await;
    }

    pub fn stop(&self) {
        self.supervisor.stop();
    }

    pub fn uptime(&self) -> Duration {
        self.supervisor.uptime()
    }

    /// Full status snapshot, connection and lock.
    pub fn status(&self) -> StatusSnapshot {
        let mut snapshot = self.supervisor.snapshot();
        let lock = self.state.lock.lock();
        snapshot.lock_state = lock.is_locked();
        snapshot.lock_reason = lock.reason().to_string();
        snapshot.locked_by = lock.locked_by().to_string();
        snapshot
    }
}
