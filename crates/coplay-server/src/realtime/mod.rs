//! Realtime runtime (session state + egress) for the coplay server.

pub mod core;

pub use self::core::{Connection, RealtimeCore, RealtimeCtx, Session, SessionRegistry, WorldState};
