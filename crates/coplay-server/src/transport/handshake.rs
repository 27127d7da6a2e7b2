//! Login handshake.
//!
//! The first data frame on a new connection must be a `login`. It is checked
//! against the server password, the username rules and the session limit
//! before a session id is assigned. A rejection is answered with a `response`
//! of type `login` whose data is the reason string, then the socket closes.

use thiserror::Error;

use coplay_core::protocol::{Login, Message, Response};

use crate::config::schema::ServerSection;
use crate::realtime::SessionRegistry;

pub const MAX_USERNAME_CHARS: usize = 32;

/// Why a login was refused. Displays as the reason string sent to the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LoginRejection {
    #[error("expected_login")]
    ExpectedLogin,
    #[error("invalid_username")]
    InvalidUsername,
    #[error("wrong_password")]
    WrongPassword,
    #[error("server_full")]
    ServerFull,
}

impl LoginRejection {
    pub fn as_str(self) -> &'static str {
        match self {
            LoginRejection::ExpectedLogin => "expected_login",
            LoginRejection::InvalidUsername => "invalid_username",
            LoginRejection::WrongPassword => "wrong_password",
            LoginRejection::ServerFull => "server_full",
        }
    }

    pub fn response(self) -> Response {
        Response::new("login", self.as_str())
    }
}

/// Validate a first frame. Returns the trimmed display name on success.
pub fn check_login(
    cfg: &ServerSection,
    sessions: &SessionRegistry,
    first: &Message,
) -> Result<String, LoginRejection> {
    let Message::Login(login) = first else {
        return Err(LoginRejection::ExpectedLogin);
    };
    check_credentials(cfg, login)?;

    if sessions.len() >= cfg.max_sessions {
        return Err(LoginRejection::ServerFull);
    }
    username(login)
}

fn check_credentials(cfg: &ServerSection, login: &Login) -> Result<(), LoginRejection> {
    let Some(expected) = cfg.password.as_deref() else {
        return Ok(());
    };
    match login.password() {
        Ok(given) if given == expected => Ok(()),
        _ => Err(LoginRejection::WrongPassword),
    }
}

fn username(login: &Login) -> Result<String, LoginRejection> {
    let name = login
        .username()
        .map(str::trim)
        .map_err(|_| LoginRejection::InvalidUsername)?;
    if name.is_empty() || name.chars().count() > MAX_USERNAME_CHARS {
        return Err(LoginRejection::InvalidUsername);
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::{Connection, Session};
    use coplay_core::protocol::{Chat, SessionId};

    fn cfg(password: Option<&str>, max_sessions: usize) -> ServerSection {
        ServerSection {
            password: password.map(str::to_string),
            max_sessions,
            ..ServerSection::default()
        }
    }

    fn login(user: &str, pass: &str) -> Message {
        Message::Login(Login::new(user, pass, "uid"))
    }

    #[test]
    fn accepts_trimmed_name() {
        let reg = SessionRegistry::new();
        let name = check_login(&cfg(None, 4), &reg, &login("  ana ", "")).unwrap();
        assert_eq!(name, "ana");
    }

    #[test]
    fn first_frame_must_be_login() {
        let reg = SessionRegistry::new();
        let chat = Message::Chat(Chat::new("hi", None));
        assert_eq!(
            check_login(&cfg(None, 4), &reg, &chat),
            Err(LoginRejection::ExpectedLogin)
        );
    }

    #[test]
    fn password_must_match_when_set() {
        let reg = SessionRegistry::new();
        let c = cfg(Some("hunter2"), 4);
        assert_eq!(
            check_login(&c, &reg, &login("ana", "nope")),
            Err(LoginRejection::WrongPassword)
        );
        assert!(check_login(&c, &reg, &login("ana", "hunter2")).is_ok());
    }

    #[test]
    fn blank_or_long_names_are_refused() {
        let reg = SessionRegistry::new();
        let c = cfg(None, 4);
        assert_eq!(
            check_login(&c, &reg, &login("   ", "")),
            Err(LoginRejection::InvalidUsername)
        );
        let long = "x".repeat(MAX_USERNAME_CHARS + 1);
        assert_eq!(
            check_login(&c, &reg, &login(&long, "")),
            Err(LoginRejection::InvalidUsername)
        );
    }

    #[test]
    fn full_server_refuses() {
        let reg = SessionRegistry::new();
        let (conn, _rx) = Connection::channel(1);
        reg.register(Session::new(SessionId(1), "ana", conn)).unwrap();
        assert_eq!(
            check_login(&cfg(None, 1), &reg, &login("bob", "")),
            Err(LoginRejection::ServerFull)
        );
    }

    #[test]
    fn rejection_response_carries_reason() {
        let resp = LoginRejection::ServerFull.response();
        assert_eq!(resp.response_type().unwrap(), "login");
        assert_eq!(resp.data().unwrap().as_str(), Some("server_full"));
        assert_eq!(LoginRejection::WrongPassword.to_string(), "wrong_password");
    }
}
