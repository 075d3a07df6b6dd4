use crate::server::error::ErrorSender;
use crate::server::types::SessionId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use tokio::sync::RwLock;
use tracing::debug;

/// What the registry remembers about a running session.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub peer_addr: SocketAddr,
    pub started_at: DateTime<Utc>,
}

impl SessionEntry {
    pub fn new(peer_addr: SocketAddr) -> Self {
        Self {
            peer_addr,
            started_at: Utc::now(),
        }
    }
}

/// Bounded, concurrency-safe directory of active sessions.
///
/// The only state shared across session tasks. Add, remove and the size
/// check all go through the same lock; the acceptor is the only admitter,
/// so the size can never pass `max_sessions`.
pub struct SessionRegistry {
    max_sessions: usize,
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    errors: ErrorSender,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize, errors: ErrorSender) -> Self {
        Self {
            max_sessions,
            sessions: RwLock::new(HashMap::new()),
            errors,
        }
    }

    /// Register a session. Capacity is the caller's concern; this fails
    /// only on a duplicate identifier, which indicates an id-derivation
    /// bug and is handled defensively.
    pub async fn try_add(&self, id: SessionId, entry: SessionEntry) -> bool {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&id) {
            return false;
        }
        debug!(session = %id, peer = %entry.peer_addr, "session registered");
        sessions.insert(id, entry);
        true
    }

    /// Deregister a session. A missing entry is a lifecycle bug: it is
    /// reported on the error channel, but removal always completes.
    pub async fn remove(&self, id: SessionId) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(&id).is_none() {
            self.errors.report_for_session(
                Some(id),
                "registry",
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("session {id} was not registered at removal"),
                ),
            );
        } else {
            debug!(session = %id, "session deregistered");
        }
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether another session may be admitted.
    pub async fn has_capacity(&self) -> bool {
        self.sessions.read().await.len() < self.max_sessions
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }
}
