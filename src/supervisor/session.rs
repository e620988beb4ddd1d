//! A single game session and the listeners attached to it.

use crate::error::TransportError;
use crate::transport::Transport;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use zybot_proto::ClientOp;

/// Stable identity for a listener or ready callback.
///
/// Registering twice under the same key replaces (listeners) or is ignored
/// (ready callbacks), never duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListenerKey {
    owner: String,
    name: String,
}

impl ListenerKey {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Component (usually a plugin name) that owns the key.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ListenerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner, self.name)
    }
}

/// Receives inbound chat traffic for one session.
///
/// Callbacks run on the session's event task and must not block.
pub trait SessionListener: Send + Sync {
    /// A player chat line.
    fn on_chat(&self, _session: &Session, _username: &str, _message: &str) {}

    /// A rendered system message.
    fn on_system_message(&self, _session: &Session, _message: &str) {}
}

type ListenerList = Vec<(ListenerKey, Arc<dyn SessionListener>)>;

/// Handle on one connected game session.
///
/// Cheap to clone; every clone refers to the same session.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    generation: u64,
    transport: Arc<dyn Transport>,
    username: RwLock<String>,
    listeners: RwLock<ListenerList>,
}

impl Session {
    pub(crate) fn new(generation: u64, transport: Arc<dyn Transport>, username: String) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                generation,
                transport,
                username: RwLock::new(username),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Connection attempt this session belongs to.
    pub fn generation(&self) -> u64 {
        self.inner.generation
    }

    /// Name the bot is known by on the server.
    pub fn username(&self) -> String {
        self.inner.username.read().clone()
    }

    pub(crate) fn set_username(&self, username: String) {
        *self.inner.username.write() = username;
    }

    pub(crate) fn send(&self, op: ClientOp) -> Result<(), TransportError> {
        self.inner.transport.send(op)
    }

    /// Attach a listener. An existing listener with the same key is replaced.
    pub fn attach(&self, key: ListenerKey, listener: Arc<dyn SessionListener>) {
        let mut listeners = self.inner.listeners.write();
        match listeners.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = listener,
            None => listeners.push((key, listener)),
        }
    }

    /// Detach the listener registered under `key`. Returns whether one existed.
    pub fn detach(&self, key: &ListenerKey) -> bool {
        let mut listeners = self.inner.listeners.write();
        let before = listeners.len();
        listeners.retain(|(k, _)| k != key);
        listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    fn snapshot(&self) -> Vec<Arc<dyn SessionListener>> {
        self.inner
            .listeners
            .read()
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect()
    }

    pub(crate) fn emit_chat(&self, username: &str, message: &str) {
        for listener in self.snapshot() {
            listener.on_chat(self, username, message);
        }
    }

    pub(crate) fn emit_system_message(&self, message: &str) {
        for listener in self.snapshot() {
            listener.on_system_message(self, message);
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("generation", &self.inner.generation)
            .field("username", &*self.inner.username.read())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct NullTransport;

    impl Transport for NullTransport {
        fn send(&self, _op: ClientOp) -> Result<(), TransportError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        lines: Mutex<Vec<String>>,
    }

    impl SessionListener for Recorder {
        fn on_chat(&self, _session: &Session, username: &str, message: &str) {
            self.lines.lock().push(format!("{username}: {message}"));
        }
    }

    fn session() -> Session {
        Session::new(1, Arc::new(NullTransport), "bot".into())
    }

    #[test]
    fn attaching_same_key_replaces() {
        let session = session();
        let key = ListenerKey::new("dispatcher", "chat");
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());

        session.attach(key.clone(), first.clone());
        session.attach(key.clone(), second.clone());
        assert_eq!(session.listener_count(), 1);

        session.emit_chat("alice", "hi");
        assert!(first.lines.lock().is_empty());
        assert_eq!(*second.lines.lock(), vec!["alice: hi"]);
    }

    #[test]
    fn detach_reports_presence() {
        let session = session();
        let key = ListenerKey::new("p", "l");
        assert!(!session.detach(&key));
        session.attach(key.clone(), Arc::new(Recorder::default()));
        assert!(session.detach(&key));
        assert_eq!(session.listener_count(), 0);
    }

    #[test]
    fn key_display() {
        assert_eq!(ListenerKey::new("hitokoto", "quote").to_string(), "hitokoto:quote");
    }
}
