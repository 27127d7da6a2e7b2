//! Codec contract tests: every catalog kind survives encode/decode with its
//! field set and key order intact.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use coplay_core::protocol::{
    decode, decode_message, encode, Chat, Data, Envelope, GameSpeed, GameWorld, Login, Message,
    MessageKind, Payload, PrivateChat, Request, Response, ServerChat, ServerChatType, SessionId,
    SpeedMode, UserRef, Value, WorldDelta, MAX_NESTING_DEPTH,
};
use coplay_core::CoplayError;

fn ana() -> UserRef {
    UserRef::new(SessionId(1), "ana")
}

fn world() -> WorldDelta {
    let office = Payload::new()
        .with("floor", Value::Int(2))
        .with("rent", Value::Float(1250.5))
        .with("players", Value::List(vec![Value::Str("ana".into()), Value::Null]));
    WorldDelta::new(Payload::new().with("office:7", office).with("founded", true))
}

fn catalog() -> Vec<Envelope> {
    vec![
        Login::new("ana", "secret", "3f0c").into(),
        GameWorld::new(world(), true).into(),
        Response::new("userlist", Value::List(vec![Value::User(ana())])).into(),
        Response::new("login", Value::Null).into(),
        ServerChat::new("server restarting", ServerChatType::Warn).into(),
        PrivateChat::new(ana(), "2", "psst").into(),
        Chat::new("hi", Some(ana())).into(),
        Chat::new("anonymous hi", None).into(),
        Request::new("gameworld").into(),
        Data::from_pairs([("zeta", "1"), ("alpha", "2")]).into(),
        GameSpeed::new(4, SpeedMode::Vote).into(),
    ]
}

#[test]
fn every_kind_round_trips() {
    for env in catalog() {
        let bytes = encode(&env).unwrap();
        let back = decode(&bytes).unwrap();
        assert_eq!(back.kind(), env.kind());
        assert_eq!(back.payload(), env.payload(), "kind={}", env.kind());

        let keys: Vec<&str> = back.payload().keys().collect();
        let expected: Vec<&str> = env.payload().keys().collect();
        assert_eq!(keys, expected, "key order, kind={}", env.kind());
    }
}

#[test]
fn decoded_messages_select_their_kind() {
    for env in catalog() {
        let bytes = encode(&env).unwrap();
        let msg = decode_message(&bytes).unwrap();
        assert_eq!(msg.kind().map(MessageKind::tag), Some(env.kind()));
    }
}

#[test]
fn re_encoding_is_byte_identical() {
    for env in catalog() {
        let first = encode(&env).unwrap();
        let once = encode(&decode(&first).unwrap()).unwrap();
        let twice = encode(&decode(&once).unwrap()).unwrap();
        assert_eq!(first, once);
        assert_eq!(once, twice);
    }
}

#[test]
fn typed_accessors_survive_the_wire() {
    let bytes = encode(&GameWorld::new(world(), false).into()).unwrap();
    let Message::GameWorld(gw) = decode_message(&bytes).unwrap() else {
        panic!("expected gameworld");
    };
    assert!(!gw.is_addition().unwrap());
    assert_eq!(gw.changes().unwrap(), &world());

    let bytes = encode(&PrivateChat::new(ana(), "2", "psst").into()).unwrap();
    let Message::PrivateChat(pm) = decode_message(&bytes).unwrap() else {
        panic!("expected pm");
    };
    assert_eq!(pm.sender().unwrap(), &ana());
    assert_eq!(pm.receiver().unwrap(), "2");
    assert_eq!(pm.message().unwrap(), "psst");
}

#[test]
fn unknown_kind_decodes_to_generic_envelope() {
    let mut env = Envelope::new("totally_unknown");
    env.insert("anything", Value::Int(42));
    let bytes = encode(&env).unwrap();

    let msg = decode_message(&bytes).unwrap();
    let Message::Unknown(raw) = msg else {
        panic!("expected unknown");
    };
    assert_eq!(raw.kind(), "totally_unknown");
    assert_eq!(raw.payload().get("anything"), Some(&Value::Int(42)));
}

#[test]
fn truncated_frame_is_a_decode_error() {
    let bytes = encode(&Chat::new("hi", Some(ana())).into()).unwrap();
    for cut in [0, 1, bytes.len() / 2, bytes.len() - 1] {
        let err = decode(&bytes[..cut]).unwrap_err();
        assert!(matches!(err, CoplayError::Decode(_)), "cut={cut}");
    }
}

#[test]
fn wrongly_tagged_value_is_a_decode_error() {
    let raw = br#"{"kind":"chat","payload":{"message":{"t":"int","v":"hi"}}}"#;
    assert!(matches!(decode(raw), Err(CoplayError::Decode(_))));
}

#[test]
fn decode_rejects_excessive_nesting() {
    let levels = MAX_NESTING_DEPTH + 4;
    let mut value = String::from(r#"{"t":"int","v":1}"#);
    for _ in 0..levels {
        value = format!(r#"{{"t":"list","v":[{value}]}}"#);
    }
    let raw = format!(r#"{{"kind":"data","payload":{{"deep":{value}}}}}"#);

    let err = decode(raw.as_bytes()).unwrap_err();
    assert!(matches!(err, CoplayError::NestingTooDeep { .. }), "got {err}");
}

#[test]
fn floats_survive_exactly() {
    let awkward = [
        1.0715660391465826e-75,
        -1.81996730402717e-179,
        -1.603964615428183e143,
        0.1 + 0.2,
        f64::MIN_POSITIVE,
    ];
    let data = Data::from_pairs(
        awkward
            .iter()
            .enumerate()
            .map(|(i, f)| (format!("f{i}"), Value::Float(*f))),
    );
    let env: Envelope = data.into();

    let bytes = encode(&env).unwrap();
    let back = decode(&bytes).unwrap();
    for (i, f) in awkward.iter().enumerate() {
        let Some(Value::Float(got)) = back.payload().get(&format!("f{i}")) else {
            panic!("f{i} missing");
        };
        assert_eq!(got.to_bits(), f.to_bits(), "f{i}");
    }
    assert_eq!(encode(&back).unwrap(), bytes);
}

#[test]
fn wide_payload_decodes_in_order() {
    const KEYS: usize = 50_000;
    let env: Envelope = Data::from_pairs((0..KEYS).map(|i| (format!("k{i}"), Value::Null))).into();
    let bytes = encode(&env).unwrap();

    let started = std::time::Instant::now();
    let back = decode(&bytes).unwrap();
    assert!(
        started.elapsed() < std::time::Duration::from_secs(2),
        "decode took {:?}",
        started.elapsed()
    );

    assert_eq!(back.payload().len(), KEYS);
    assert_eq!(back.payload().keys().next(), Some("k0"));
    assert_eq!(back.payload().keys().last(), Some("k49999"));
    assert_eq!(back, env);
}
