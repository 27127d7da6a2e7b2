//! Built-in message handlers.

pub mod chat;
pub mod relay;
pub mod request;
pub mod world;

pub use chat::ChatService;
pub use relay::DataRelayService;
pub use request::RequestService;
pub use world::WorldService;
