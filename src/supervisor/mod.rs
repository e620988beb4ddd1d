//! Connection lifecycle supervision.
//!
//! ```text
//! Stopped --start()--> Starting --spawn--> Running --end--> Stopped --timer--> Starting
//!                                            |
//!                                          error --> Errored (no reconnect by itself)
//! ```
//!
//! The supervisor owns the game session. Higher layers never hold on to a
//! session across reconnects; instead they register a ready callback which
//! is replayed with the fresh [`Session`] every time the bot spawns.

mod session;

pub use session::{ListenerKey, Session, SessionListener};

use crate::telemetry::spans;
use crate::transport::Connector;
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, warn};
use zybot_proto::{ClientOp, ConnectionState, LoginOptions, Position, ServerEvent, StatusSnapshot};

/// Line sent to the game right before quitting.
pub const FAREWELL_MESSAGE: &str = "&#084cfbZ&#1458fby&#2064fbB&#2b70fbo&#377cfct&#4388fc正&#4f94fc在&#5ba0fc退&#66abfc出&#72b7fc游&#7ec3fc戏&#8acffd，&#95dbfd请&#a1e7fd稍&#adf3fd后";

/// Callback replayed on every successful (re)connection.
pub type ReadyCallback = Arc<dyn Fn(&Session) -> anyhow::Result<()> + Send + Sync>;

/// Supervises the game session and reconnects on disconnect.
///
/// Cloning yields another handle on the same supervisor.
#[derive(Clone)]
pub struct ConnectionSupervisor {
    inner: Arc<Inner>,
}

struct Inner {
    connector: Arc<dyn Connector>,
    login: LoginOptions,
    reconnect_interval: Duration,
    state: Mutex<LinkState>,
    callbacks: Mutex<Vec<(ListenerKey, ReadyCallback)>>,
}

struct ReconnectTimer {
    id: u64,
    handle: JoinHandle<()>,
}

struct LinkState {
    connection: ConnectionState,
    /// Bumped on every start/stop; events tagged with an older value are stale.
    generation: u64,
    session: Option<Session>,
    reconnect_attempts: u32,
    started: Option<(DateTime<Local>, Instant)>,
    position: Position,
    world: String,
    error_message: String,
    timer_seq: u64,
    reconnect_timer: Option<ReconnectTimer>,
}

impl ConnectionSupervisor {
    pub fn new(
        connector: Arc<dyn Connector>,
        login: LoginOptions,
        reconnect_interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector,
                login,
                reconnect_interval,
                state: Mutex::new(LinkState {
                    connection: ConnectionState::Stopped,
                    generation: 0,
                    session: None,
                    reconnect_attempts: 0,
                    started: None,
                    position: Position::default(),
                    world: String::new(),
                    error_message: String::new(),
                    timer_seq: 0,
                    reconnect_timer: None,
                }),
                callbacks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Open a new game session, replacing any current one.
    ///
    /// A session that is still open is told to quit, and a pending reconnect
    /// is cancelled. A connect failure is recorded and treated as a
    /// disconnect, so the next attempt is scheduled.
    pub async fn start(&self) {
        let (generation, previous) = {
            let mut st = self.inner.state.lock();
            st.generation += 1;
            if let Some(timer) = st.reconnect_timer.take() {
                timer.handle.abort();
            }
            let previous = st.session.take();
            st.connection = ConnectionState::Starting;
            st.error_message.clear();
            if st.reconnect_attempts == 0 {
                let now = Local::now();
                info!(start_time = %format_time(&now), "Bot start time recorded");
                st.started = Some((now, Instant::now()));
            }
            (st.generation, previous)
        };

        if let Some(previous) = previous {
            debug!(generation = previous.generation(), "Closing superseded session");
            let _ = previous.send(ClientOp::Quit);
        }

        info!(
            server = %format!("{}:{}", self.inner.login.host, self.inner.login.port),
            username = %self.inner.login.username,
            auth = %self.inner.login.auth,
            "Starting game session"
        );

        match self.inner.connector.connect(&self.inner.login).await {
            Ok(conn) => {
                let session = Session::new(
                    generation,
                    conn.transport,
                    self.inner.login.username.clone(),
                );
                {
                    let mut st = self.inner.state.lock();
                    if st.generation != generation {
                        debug!(generation, "Session superseded before it was installed");
                        return;
                    }
                    st.session = Some(session.clone());
                }
                let span = spans::session(generation);
                tokio::spawn(self.clone().run_session(session, conn.events).instrument(span));
            }
            Err(e) => {
                error!(error = %e, "Failed to open game session");
                {
                    let mut st = self.inner.state.lock();
                    if st.generation == generation {
                        st.connection = ConnectionState::Errored;
                        st.error_message = e.to_string();
                    }
                }
                self.handle_end(generation, Some(e.to_string()));
            }
        }
    }

    /// Leave the game and stay stopped.
    pub fn stop(&self) {
        let (session, timer) = {
            let mut st = self.inner.state.lock();
            st.generation += 1;
            st.connection = ConnectionState::Stopped;
            (st.session.take(), st.reconnect_timer.take())
        };

        if let Some(timer) = timer {
            timer.handle.abort();
        }
        if let Some(session) = session {
            let _ = session.send(ClientOp::Chat {
                message: FAREWELL_MESSAGE.to_string(),
            });
            let _ = session.send(ClientOp::Quit);
        }
        info!("Bot stopped");
    }

    /// Send a chat line. Dropped unless the session is running.
    pub fn chat(&self, message: impl Into<String>) -> bool {
        let session = {
            let st = self.inner.state.lock();
            if st.connection != ConnectionState::Running {
                None
            } else {
                st.session.clone()
            }
        };

        let message = message.into();
        let Some(session) = session else {
            debug!(message = %message, "Not running, chat dropped");
            return false;
        };

        match session.send(ClientOp::Chat { message }) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to send chat");
                false
            }
        }
    }

    /// Register a callback run on every transition into `Running`.
    ///
    /// A key already registered is ignored. If the bot is running right now
    /// the callback also runs immediately. Returns whether it was added.
    pub fn on_ready<F>(&self, key: ListenerKey, callback: F) -> bool
    where
        F: Fn(&Session) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let callback: ReadyCallback = Arc::new(callback);
        // Decided under the callbacks lock: a spawn either sees this callback
        // in its snapshot or has already flipped to Running, never both.
        let run_now = {
            let mut callbacks = self.inner.callbacks.lock();
            if callbacks.iter().any(|(k, _)| *k == key) {
                debug!(key = %key, "Ready callback already registered");
                return false;
            }
            callbacks.push((key.clone(), Arc::clone(&callback)));
            self.running_session()
        };

        if let Some(session) = run_now {
            run_callback(&key, &callback, &session);
        }
        true
    }

    /// Drop every ready callback owned by `owner`.
    pub fn remove_ready_callbacks(&self, owner: &str) -> usize {
        let mut callbacks = self.inner.callbacks.lock();
        let before = callbacks.len();
        callbacks.retain(|(k, _)| k.owner() != owner);
        before - callbacks.len()
    }

    pub fn ready_callback_count(&self) -> usize {
        self.inner.callbacks.lock().len()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.lock().connection
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.inner.state.lock().reconnect_attempts
    }

    /// Whether a reconnect is currently scheduled.
    pub fn reconnect_pending(&self) -> bool {
        self.inner.state.lock().reconnect_timer.is_some()
    }

    /// Current session, if one is open.
    pub fn session(&self) -> Option<Session> {
        self.inner.state.lock().session.clone()
    }

    /// Name the bot is known by: the live session's, else the configured one.
    pub fn username(&self) -> String {
        match self.session() {
            Some(session) => session.username(),
            None => self.inner.login.username.clone(),
        }
    }

    /// Time since the first start.
    pub fn uptime(&self) -> Duration {
        self.inner
            .state
            .lock()
            .started
            .map(|(_, at)| at.elapsed())
            .unwrap_or_default()
    }

    /// Connection half of the status snapshot. Lock fields are left empty.
    pub fn snapshot(&self) -> StatusSnapshot {
        let st = self.inner.state.lock();
        StatusSnapshot {
            connection_state: st.connection,
            start_time: st.started.as_ref().map(|(t, _)| format_time(t)),
            uptime_seconds: st
                .started
                .map(|(_, at)| at.elapsed().as_secs_f64())
                .unwrap_or_default(),
            server: format!("{}:{}", self.inner.login.host, self.inner.login.port),
            username: self.inner.login.username.clone(),
            position: st.position,
            world: st.world.clone(),
            error_message: st.error_message.clone(),
            reconnect_attempts: st.reconnect_attempts,
            ..StatusSnapshot::default()
        }
    }

    fn running_session(&self) -> Option<Session> {
        let st = self.inner.state.lock();
        if st.connection == ConnectionState::Running {
            st.session.clone()
        } else {
            None
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.inner.state.lock().generation == generation
    }

    async fn run_session(self, session: Session, mut events: mpsc::Receiver<ServerEvent>) {
        let generation = session.generation();
        while let Some(event) = events.recv().await {
            if !self.is_current(generation) {
                debug!(generation, "Ignoring event from superseded session");
                return;
            }
            if let ServerEvent::End { reason } = event {
                self.handle_end(generation, reason);
                return;
            }
            self.handle_event(&session, event);
        }
        self.handle_end(generation, Some("event stream closed".to_string()));
    }

    fn handle_event(&self, session: &Session, event: ServerEvent) {
        match event {
            ServerEvent::Spawn { username } => {
                if let Some(name) = username {
                    session.set_username(name);
                }
                // Lock order: callbacks, then state (same as `on_ready`).
                let callbacks = {
                    let callbacks = self.inner.callbacks.lock();
                    let mut st = self.inner.state.lock();
                    st.connection = ConnectionState::Running;
                    st.error_message.clear();
                    if st.reconnect_attempts > 0 {
                        info!(attempts = st.reconnect_attempts, "Reconnected, attempt counter reset");
                        st.reconnect_attempts = 0;
                    }
                    callbacks.clone()
                };
                info!(username = %session.username(), "Bot spawned in game");
                for (key, callback) in &callbacks {
                    run_callback(key, callback, session);
                }
            }
            ServerEvent::Chat { username, message } => session.emit_chat(&username, &message),
            ServerEvent::MessageStr { message } => session.emit_system_message(&message),
            ServerEvent::Move { position, world } => {
                let mut st = self.inner.state.lock();
                st.position = position.rounded();
                if let Some(world) = world {
                    st.world = world;
                }
            }
            ServerEvent::Error { message } => {
                error!(error = %message, "Game session error");
                let mut st = self.inner.state.lock();
                st.connection = ConnectionState::Errored;
                st.error_message = message;
            }
            ServerEvent::End { reason } => self.handle_end(session.generation(), reason),
        }
    }

    fn handle_end(&self, generation: u64, reason: Option<String>) {
        let mut st = self.inner.state.lock();
        if st.generation != generation {
            return;
        }
        st.session = None;
        st.connection = ConnectionState::Stopped;
        st.reconnect_attempts += 1;
        info!(
            reason = reason.as_deref().unwrap_or("unknown"),
            attempt = st.reconnect_attempts,
            delay_secs = self.inner.reconnect_interval.as_secs(),
            "Disconnected, scheduling reconnect"
        );
        self.schedule_reconnect(&mut st);
    }

    /// Arm the reconnect timer, replacing any pending one.
    fn schedule_reconnect(&self, st: &mut LinkState) {
        if let Some(old) = st.reconnect_timer.take() {
            old.handle.abort();
        }
        st.timer_seq += 1;
        let id = st.timer_seq;
        let delay = self.inner.reconnect_interval;
        let supervisor = self.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let attempt = {
                let mut st = supervisor.inner.state.lock();
                match &st.reconnect_timer {
                    Some(timer) if timer.id == id => st.reconnect_timer = None,
                    _ => return,
                }
                st.reconnect_attempts
            };
            info!(attempt, "Reconnecting");
            supervisor.start().await;
        });

        st.reconnect_timer = Some(ReconnectTimer { id, handle });
    }
}

fn run_callback(key: &ListenerKey, callback: &ReadyCallback, session: &Session) {
    if let Err(e) = callback(session) {
        error!(key = %key, error = %e, "Ready callback failed");
    }
}

fn format_time(t: &DateTime<Local>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}
