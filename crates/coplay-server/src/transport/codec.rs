//! Decode-once codec for the transport layer.
//!
//! - Binary (and text) frames => `Message` via the envelope codec
//! - Ping/Pong/Close are surfaced for lifecycle management

use axum::extract::ws::Message as WsMessage;
use bytes::Bytes;

use coplay_core::error::Result;
use coplay_core::protocol::{decode_message, Message};

#[derive(Debug)]
pub enum Inbound {
    Envelope(Message),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

/// Smallest socket-level read limit.
pub const MIN_READ_LIMIT: usize = 64 * 1024;

/// Socket-level message limit for a configured frame limit.
///
/// Kept above `max_frame_bytes` so an oversized frame is still read and can
/// be dropped by the session loop instead of failing the socket.
pub fn read_limit(max_frame_bytes: usize) -> usize {
    max_frame_bytes.saturating_mul(4).max(MIN_READ_LIMIT)
}

/// Size of the frame's data before decoding, for the frame limit.
pub fn frame_len(msg: &WsMessage) -> usize {
    match msg {
        WsMessage::Text(s) => s.len(),
        WsMessage::Binary(b) => b.len(),
        WsMessage::Ping(v) | WsMessage::Pong(v) => v.len(),
        WsMessage::Close(_) => 0,
    }
}

pub fn decode(msg: WsMessage) -> Result<Inbound> {
    match msg {
        WsMessage::Binary(b) => Ok(Inbound::Envelope(decode_message(&b)?)),
        WsMessage::Text(s) => Ok(Inbound::Envelope(decode_message(s.as_bytes())?)),
        WsMessage::Ping(v) => Ok(Inbound::Ping(v)),
        WsMessage::Pong(v) => Ok(Inbound::Pong(v)),
        WsMessage::Close(_) => Ok(Inbound::Close),
    }
}

/// Encoded envelopes always travel as binary frames.
pub fn frame(bytes: Bytes) -> WsMessage {
    WsMessage::Binary(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use coplay_core::protocol::{encode, Chat, MessageKind};

    #[test]
    fn binary_frame_decodes_to_message() {
        let bytes = encode(Chat::new("hi", None).envelope()).unwrap();
        match decode(frame(bytes)).unwrap() {
            Inbound::Envelope(msg) => assert_eq!(msg.kind(), Some(MessageKind::Chat)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn read_limit_stays_above_frame_limit() {
        assert_eq!(read_limit(1024), MIN_READ_LIMIT);
        assert_eq!(read_limit(1024 * 1024), 4 * 1024 * 1024);
        assert_eq!(read_limit(usize::MAX), usize::MAX);
        for max in [1024, 65_536, 16 * 1024 * 1024] {
            assert!(read_limit(max) > max);
        }
    }

    #[test]
    fn frame_len_measures_data() {
        assert_eq!(frame_len(&WsMessage::Binary(vec![0; 4096])), 4096);
        assert_eq!(frame_len(&WsMessage::Text("abc".into())), 3);
        assert_eq!(frame_len(&WsMessage::Close(None)), 0);
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(decode(WsMessage::Binary(b"{\"kind\":".to_vec())).is_err());
    }

    #[test]
    fn control_frames_pass_through() {
        assert!(matches!(decode(WsMessage::Ping(vec![1])).unwrap(), Inbound::Ping(_)));
        assert!(matches!(decode(WsMessage::Close(None)).unwrap(), Inbound::Close));
    }
}
