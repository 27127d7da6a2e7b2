//! coplay core: transport-agnostic message model, kind catalog, codec, and
//! the shared error type.
//!
//! This crate defines the wire contract shared by the server, the client, and
//! any tooling. It carries no runtime or transport dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Every fallible path surfaces as `CoplayError`/`Result` so a malformed frame
//! from a peer can never crash the process.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{ClientCode, CoplayError, Result};
