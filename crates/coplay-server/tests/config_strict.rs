#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use coplay_server::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
server:
  listen: "0.0.0.0:7777"
  max_sesions: 8 # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "INTERNAL");
    assert!(err.to_string().contains("invalid yaml"));
}

#[test]
fn ok_minimal_config() {
    let ok = "version: 1\n";
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.server.listen, "0.0.0.0:7777");
    assert_eq!(cfg.server.max_sessions, 16);
    assert!(cfg.server.password.is_none());
}

#[test]
fn full_config_parses() {
    let ok = r#"
version: 1
server:
  listen: "127.0.0.1:9000"
  password: "hunter2"
  max_sessions: 4
  max_frame_bytes: 65536
  outbound_queue: 32
  write_timeout_ms: 500
  login_timeout_ms: 1000
  ping_interval_ms: 5000
  idle_timeout_ms: 15000
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.server.password.as_deref(), Some("hunter2"));
    assert_eq!(cfg.server.outbound_queue, 32);
}

#[test]
fn rejects_wrong_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert!(err.to_string().contains("version"));
}

#[test]
fn idle_must_exceed_ping() {
    let bad = r#"
version: 1
server:
  ping_interval_ms: 20000
  idle_timeout_ms: 20000
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert!(err.to_string().contains("idle_timeout_ms"));
}

#[test]
fn zero_queue_is_rejected() {
    let bad = r#"
version: 1
server:
  outbound_queue: 0
"#;
    assert!(config::load_from_str(bad).is_err());
}
