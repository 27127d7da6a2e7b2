use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use coplay_core::error::{CoplayError, Result};
use coplay_core::protocol::{SessionId, UserRef};

/// One session's outbound queue sender (encoded envelopes, FIFO).
#[derive(Debug, Clone)]
pub struct Connection {
    tx: mpsc::Sender<Bytes>,
}

impl Connection {
    /// Bounded queue; the receiver belongs to the connection's writer.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Enqueue without waiting. A full or closed queue fails immediately.
    pub fn try_deliver(&self, id: SessionId, bytes: Bytes) -> Result<()> {
        self.tx.try_send(bytes).map_err(|e| {
            let reason = match e {
                TrySendError::Full(_) => "outbound queue full",
                TrySendError::Closed(_) => "connection closed",
            };
            CoplayError::DeliveryFailed {
                id: id.get(),
                reason: reason.into(),
            }
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// A logged-in peer: identity plus its outbound queue.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    name: Arc<str>,
    conn: Connection,
}

impl Session {
    pub fn new(id: SessionId, name: impl Into<Arc<str>>, conn: Connection) -> Self {
        Self {
            id,
            name: name.into(),
            conn,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn display_name(&self) -> &str {
        &self.name
    }

    pub fn user_ref(&self) -> UserRef {
        UserRef::new(self.id, self.display_name())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Session registry: `SessionId -> Session`.
///
/// Mutated only by login/disconnect (and operator kicks); read by every
/// handler that resolves a target. Ids come from a counter starting at 1 and
/// are never handed out twice, so `0` stays free for the server sentinel.
pub struct SessionRegistry {
    sessions: DashMap<SessionId, Session>,
    next_id: AtomicU64,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> SessionId {
        SessionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Add a session. An id that is already live means id assignment is
    /// broken, so this is an error rather than a replace.
    pub fn register(&self, session: Session) -> Result<()> {
        match self.sessions.entry(session.id()) {
            Entry::Occupied(e) => Err(CoplayError::DuplicateSession(e.key().get())),
            Entry::Vacant(e) => {
                e.insert(session);
                Ok(())
            }
        }
    }

    /// Remove a session; absent ids are ignored.
    pub fn unregister(&self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id).map(|(_, s)| s)
    }

    pub fn lookup(&self, id: SessionId) -> Option<Session> {
        self.sessions.get(&id).map(|r| r.value().clone())
    }

    /// Resolve a textual id (as carried in `pm.receiver`). Anything that is not
    /// a live numeric id resolves to `None`.
    pub fn lookup_str(&self, id: &str) -> Option<Session> {
        let id: SessionId = id.parse().ok()?;
        self.lookup(id)
    }

    /// Point-in-time copy of every live session.
    pub fn snapshot(&self) -> Vec<Session> {
        self.sessions.iter().map(|r| r.value().clone()).collect()
    }

    /// Connected users ordered by id.
    pub fn users(&self) -> Vec<UserRef> {
        let mut users: Vec<UserRef> = self.sessions.iter().map(|r| r.value().user_ref()).collect();
        users.sort_by_key(|u| u.id);
        users
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
