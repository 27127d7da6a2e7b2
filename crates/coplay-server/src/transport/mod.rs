//! Transport layer (WebSocket).
//!
//! Exposes the WS upgrade handler, the login handshake, and the codec that
//! decodes frames once before they reach the dispatcher.

pub mod codec;
pub mod handshake;
pub mod ws;
