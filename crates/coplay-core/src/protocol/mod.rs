//! Wire protocol: envelope model, kind catalog, and codec.
//!
//! - `value`: ordered `Payload` and the tagged `Value` union (plus the
//!   `UserRef`/`WorldDelta` domain objects carried inside payloads).
//! - `envelope`: the generic kind-tagged message.
//! - `kinds`: the closed catalog of concrete kinds and the `Message` sum type.
//! - `codec`: bytes <-> envelope.
//!
//! Decoding is panic-free: malformed input is reported as `CoplayError`
//! instead of panicking, so a hostile peer cannot take the server down.

pub mod codec;
pub mod envelope;
pub mod kinds;
pub mod value;

pub use codec::{decode, decode_message, encode, MAX_NESTING_DEPTH};
pub use envelope::Envelope;
pub use kinds::{
    Chat, Data, GameSpeed, GameWorld, Login, Message, MessageKind, PrivateChat, Request,
    Response, ServerChat, ServerChatType, SpeedMode, MAX_GAME_SPEED,
};
pub use value::{Payload, SessionId, UserRef, Value, WorldDelta};
