//! Top-level facade crate for coplay.
//!
//! Re-exports the protocol core and the server library so users can depend on a single crate.

pub mod core {
    pub use coplay_core::*;
}

pub mod server {
    pub use coplay_server::*;
}

pub use coplay_core::protocol::{Envelope, Message, MessageKind};
pub use coplay_server::client::Client;
