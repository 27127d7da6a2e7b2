//! Realtime core components for the server runtime.
//!
//! Session registry, shared world state, and the delivery runtime/context
//! shared across handlers.

mod realtime;
mod session_registry;
mod world;

#[cfg(test)]
pub(crate) mod test_support;

pub use realtime::{RealtimeCore, RealtimeCtx};
pub use session_registry::{Connection, Session, SessionRegistry};
pub use world::WorldState;
