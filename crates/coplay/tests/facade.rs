#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use coplay::core::protocol::{decode_message, encode, Chat};
use coplay::{Message, MessageKind};

#[test]
fn facade_exposes_protocol_and_server() {
    let bytes = encode(Chat::new("hi", None).envelope()).unwrap();
    let msg: Message = decode_message(&bytes).unwrap();
    assert_eq!(msg.kind(), Some(MessageKind::Chat));

    let cfg = coplay::server::config::load_from_str("version: 1\n").unwrap();
    assert_eq!(cfg.server.max_sessions, 16);
}
