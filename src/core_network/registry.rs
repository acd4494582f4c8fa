use crate::core_events::SessionListener;
use chrono::{DateTime, Local};
use log::debug;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio_util::sync::CancellationToken;

/// Registry view of a control session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: u32,
    pub remote_addr: SocketAddr,
    pub user: Option<String>,
    pub opened: DateTime<Local>,
    pub shutdown: CancellationToken,
}

/// Active sessions of one server, safe to mutate from every session task.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<u32, SessionInfo>>,
    next_id: AtomicU32,
    listeners: RwLock<Vec<Arc<dyn SessionListener>>>,
    shutdown: CancellationToken,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            next_id: AtomicU32::new(1),
            listeners: RwLock::new(Vec::new()),
            shutdown: CancellationToken::new(),
        }
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<u32, SessionInfo>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> Vec<Arc<dyn SessionListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn add_listener(&self, listener: Arc<dyn SessionListener>) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    pub fn next_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Token cancelled when the server stops. Sessions derive theirs from it.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn add(&self, info: SessionInfo) {
        let (id, remote) = (info.id, info.remote_addr);
        self.sessions().insert(id, info);
        debug!("session={} Registered ({} active)", id, self.len());
        for listener in self.listeners() {
            listener.session_opened(id, remote);
        }
    }

    /// Removes a session, listeners only hear about sessions that were present.
    pub fn remove(&self, id: u32) -> bool {
        let removed = self.sessions().remove(&id).is_some();
        if removed {
            debug!("session={} Unregistered", id);
            for listener in self.listeners() {
                listener.session_closed(id);
            }
        }
        removed
    }

    pub fn set_user(&self, id: u32, user: &str) {
        if let Some(info) = self.sessions().get_mut(&id) {
            info.user = Some(user.to_string());
        }
        for listener in self.listeners() {
            listener.session_logged_on(id, user);
        }
    }

    /// Snapshot of the registered ids in ascending order.
    pub fn enumerate(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self.sessions().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn snapshot(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self.sessions().values().cloned().collect();
        sessions.sort_by_key(|info| info.id);
        sessions
    }

    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signals the accept loop and every session to finish.
    pub fn shutdown_all(&self) {
        for id in self.enumerate() {
            debug!("session={} Signalled to close", id);
        }
        self.shutdown.cancel();
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes its session from the registry when the connection task ends.
pub struct SessionGuard {
    registry: Arc<SessionRegistry>,
    id: u32,
}

impl SessionGuard {
    pub fn new(registry: Arc<SessionRegistry>, id: u32) -> Self {
        Self { registry, id }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
