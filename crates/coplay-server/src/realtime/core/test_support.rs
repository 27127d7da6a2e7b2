use bytes::Bytes;
use tokio::sync::mpsc;

use coplay_core::protocol::SessionId;

use crate::realtime::core::{Connection, RealtimeCore, Session};

/// Register a session backed by a bare channel and hand back its receiver.
pub(crate) fn attach(core: &RealtimeCore, name: &str, capacity: usize) -> (SessionId, mpsc::Receiver<Bytes>) {
    let (conn, rx) = Connection::channel(capacity);
    let id = core.sessions.next_id();
    core.sessions
        .register(Session::new(id, name, conn))
        .expect("fresh id");
    (id, rx)
}
