use std::sync::Arc;

use coplay_core::error::{CoplayError, Result};
use coplay_core::protocol::{encode, Envelope, SessionId, UserRef};

use crate::obs::ServerMetrics;
use crate::realtime::core::{Session, SessionRegistry, WorldState};

/// RealtimeCore: shared session state plus the delivery primitives.
///
/// Delivery never waits on a peer: envelopes are encoded once and pushed onto
/// each session's bounded queue with `try_send`. Per-destination order is the
/// queue order.
pub struct RealtimeCore {
    pub sessions: Arc<SessionRegistry>,
    pub world: Arc<WorldState>,
    pub metrics: Arc<ServerMetrics>,
}

impl RealtimeCore {
    pub fn new(metrics: Arc<ServerMetrics>) -> Self {
        Self {
            sessions: Arc::new(SessionRegistry::new()),
            world: Arc::new(WorldState::new()),
            metrics,
        }
    }

    /// Directed send to one session. Errors if the session is gone or its
    /// queue cannot take the message; the caller decides what that means.
    pub fn send(&self, id: SessionId, env: &Envelope) -> Result<()> {
        let session = self
            .sessions
            .lookup(id)
            .ok_or(CoplayError::SessionNotFound(id.get()))?;
        let bytes = encode(env)?;
        session.connection().try_deliver(id, bytes).map_err(|e| {
            ServerMetrics::inc(&self.metrics.delivery_failures);
            e
        })
    }

    /// Best-effort fan-out to every session in a snapshot taken now. A failing
    /// destination is logged and skipped. Returns how many sessions accepted
    /// the message.
    pub fn broadcast(&self, env: &Envelope) -> Result<usize> {
        let bytes = encode(env)?;
        let targets = self.sessions.snapshot();

        let mut reached = 0;
        for session in targets {
            match session.connection().try_deliver(session.id(), bytes.clone()) {
                Ok(()) => reached += 1,
                Err(e) => {
                    ServerMetrics::inc(&self.metrics.delivery_failures);
                    tracing::warn!(session = %session.id(), kind = env.kind(), error = %e, "broadcast delivery failed");
                }
            }
        }
        Ok(reached)
    }

    /// Remove a session from routing. Its queue closes once the last sender
    /// clone is dropped, which ends the connection's loop.
    pub fn kick(&self, id: SessionId) -> Option<Session> {
        self.sessions.unregister(id)
    }
}

/// Per-message context passed to handlers (borrow tools instead of owning).
#[derive(Clone)]
pub struct RealtimeCtx {
    sender: UserRef,
    core: Arc<RealtimeCore>,
}

impl RealtimeCtx {
    pub fn new(sender: UserRef, core: Arc<RealtimeCore>) -> Self {
        Self { sender, core }
    }

    pub fn sender(&self) -> &UserRef {
        &self.sender
    }

    pub fn core(&self) -> &RealtimeCore {
        &self.core
    }

    /// Send back to the session that produced the current message.
    pub fn reply(&self, env: &Envelope) -> Result<()> {
        self.core.send(self.sender.id, env)
    }

    pub fn send_to(&self, id: SessionId, env: &Envelope) -> Result<()> {
        self.core.send(id, env)
    }

    pub fn broadcast(&self, env: &Envelope) -> Result<usize> {
        self.core.broadcast(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::core::test_support::attach;
    use coplay_core::protocol::{Chat, ServerChat};

    #[test]
    fn broadcast_fans_out_identical_bytes_in_order() {
        let core = RealtimeCore::new(Arc::default());
        let mut peers: Vec<_> = ["a", "b", "c"].iter().map(|n| attach(&core, n, 8)).collect();

        let first = Chat::new("one", None).into_envelope();
        let second = Chat::new("two", None).into_envelope();
        assert_eq!(core.broadcast(&first).unwrap(), 3);
        assert_eq!(core.broadcast(&second).unwrap(), 3);

        let expected = [encode(&first).unwrap(), encode(&second).unwrap()];
        for (_, rx) in peers.iter_mut() {
            assert_eq!(rx.try_recv().unwrap(), expected[0]);
            assert_eq!(rx.try_recv().unwrap(), expected[1]);
            assert!(rx.try_recv().is_err());
        }
    }

    #[test]
    fn broadcast_skips_dead_and_full_sessions() {
        let core = RealtimeCore::new(Arc::default());
        let (_, dead_rx) = attach(&core, "dead", 8);
        drop(dead_rx);
        let (_, _full_rx) = attach(&core, "full", 1);
        let (_, mut ok_rx) = attach(&core, "ok", 8);

        let env = ServerChat::info("hello").into_envelope();
        assert_eq!(core.broadcast(&env).unwrap(), 2);
        // "full" now has one queued message; the next broadcast overflows it.
        assert_eq!(core.broadcast(&env).unwrap(), 1);
        assert_eq!(ok_rx.try_recv().unwrap(), encode(&env).unwrap());
        assert_eq!(
            core.metrics
                .delivery_failures
                .load(std::sync::atomic::Ordering::Relaxed),
            3
        );
    }

    #[test]
    fn send_reports_missing_session() {
        let core = RealtimeCore::new(Arc::default());
        let err = core
            .send(SessionId(9), &ServerChat::info("x").into_envelope())
            .unwrap_err();
        assert!(matches!(err, CoplayError::SessionNotFound(9)));
    }

    #[test]
    fn kick_closes_the_queue() {
        let core = RealtimeCore::new(Arc::default());
        let (id, mut rx) = attach(&core, "ana", 8);
        assert!(core.kick(id).is_some());
        assert!(core.sessions.lookup(id).is_none());
        assert!(matches!(
            rx.try_recv(),
            Err(tokio::sync::mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
