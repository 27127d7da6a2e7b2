//! Envelope codec (panic-free).
//!
//! Wire format: one UTF-8 JSON object per message,
//! `{"kind":"chat","payload":{"message":{"t":"str","v":"hi"}}}`.
//! Payload key order is written and read back as-is, so re-encoding a decoded
//! envelope reproduces the same bytes.
//!
//! Rules:
//! - Decoding never returns a partially filled envelope: any JSON error,
//!   trailing garbage, or unknown top-level field fails the whole message.
//! - Value nesting is bounded by [`MAX_NESTING_DEPTH`] on both sides.
//! - Non-finite floats are refused at encode time (JSON cannot carry them).

use bytes::Bytes;

use crate::error::{CoplayError, Result};
use crate::protocol::envelope::Envelope;
use crate::protocol::kinds::Message;

/// Deepest container nesting accepted inside a payload.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Encode an envelope to wire bytes.
pub fn encode(env: &Envelope) -> Result<Bytes> {
    let depth = env.payload().depth();
    if depth > MAX_NESTING_DEPTH {
        return Err(CoplayError::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        });
    }
    if !env.payload().is_finite() {
        return Err(CoplayError::Encode(format!(
            "{}: payload holds a non-finite float",
            env.kind()
        )));
    }

    serde_json::to_vec(env)
        .map(Bytes::from)
        .map_err(|e| CoplayError::Encode(format!("{}: {e}", env.kind())))
}

/// Decode wire bytes into the generic envelope.
pub fn decode(bytes: &[u8]) -> Result<Envelope> {
    let env: Envelope = serde_json::from_slice(bytes)
        .map_err(|e| CoplayError::Decode(format!("invalid envelope: {e}")))?;

    if env.payload().depth() > MAX_NESTING_DEPTH {
        return Err(CoplayError::NestingTooDeep {
            max: MAX_NESTING_DEPTH,
        });
    }
    Ok(env)
}

/// Decode wire bytes and select the concrete kind.
/// Unknown kinds come back as [`Message::Unknown`].
pub fn decode_message(bytes: &[u8]) -> Result<Message> {
    decode(bytes).map(Message::from_envelope)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::protocol::value::{Payload, Value};

    fn nested(levels: usize) -> Payload {
        let mut p = Payload::new().with("leaf", Value::Int(1));
        for _ in 0..levels {
            p = Payload::new().with("inner", p);
        }
        p
    }

    #[test]
    fn truncated_bytes_fail() {
        let bytes = encode(&Envelope::new("request")).unwrap();
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(decode(cut), Err(CoplayError::Decode(_))));
    }

    #[test]
    fn trailing_garbage_fails() {
        let mut bytes = encode(&Envelope::new("request")).unwrap().to_vec();
        bytes.extend_from_slice(b"{}");
        assert!(matches!(decode(&bytes), Err(CoplayError::Decode(_))));
    }

    #[test]
    fn unknown_top_level_field_fails() {
        let raw = br#"{"kind":"chat","payload":{},"extra":1}"#;
        assert!(matches!(decode(raw), Err(CoplayError::Decode(_))));
    }

    #[test]
    fn missing_payload_decodes_as_empty() {
        let env = decode(br#"{"kind":"request"}"#).unwrap();
        assert!(env.payload().is_empty());
    }

    #[test]
    fn depth_limit_applies_to_encode() {
        let ok = Envelope::with_payload("data", nested(MAX_NESTING_DEPTH - 1));
        assert!(encode(&ok).is_ok());

        let deep = Envelope::with_payload("data", nested(MAX_NESTING_DEPTH + 1));
        assert!(matches!(
            encode(&deep),
            Err(CoplayError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn non_finite_float_is_refused() {
        let mut env = Envelope::new("data");
        env.insert("ratio", f64::NAN);
        assert!(matches!(encode(&env), Err(CoplayError::Encode(_))));
    }

    #[test]
    fn wire_shape_is_tagged_json() {
        let mut env = Envelope::new("request");
        env.insert("request", "userlist");
        let bytes = encode(&env).unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"kind":"request","payload":{"request":{"t":"str","v":"userlist"}}}"#
        );
    }
}
