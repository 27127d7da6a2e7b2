//! coplay server library entry.
//!
//! This crate wires the transport, dispatcher, realtime core, and built-in
//! services into a cohesive session server. It is consumed by the binary
//! (`main.rs`) and by integration tests, which also drive it through the
//! bundled [`client::Client`].

pub mod app_state;
pub mod client;
pub mod config;
pub mod console;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod realtime;
pub mod router;
pub mod services;
pub mod transport;
