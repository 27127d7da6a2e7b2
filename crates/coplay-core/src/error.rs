//! Shared error type across coplay crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed message.
    BadRequest,
    /// Login rejected.
    AuthFailed,
    /// Target session is not connected.
    NotFound,
    /// Outbound delivery could not be completed.
    Unavailable,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and error replies.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::AuthFailed => "AUTH_FAILED",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::Unavailable => "UNAVAILABLE",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, CoplayError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum CoplayError {
    /// Bytes could not be turned into an envelope.
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
    #[error("nesting deeper than {max} levels")]
    NestingTooDeep { max: usize },
    /// A required payload field is absent.
    #[error("{kind}: missing field `{field}`")]
    MissingField { kind: String, field: &'static str },
    /// A payload field is present but holds the wrong kind of value.
    #[error("{kind}: field `{field}` expected {expected}")]
    FieldType {
        kind: String,
        field: &'static str,
        expected: &'static str,
    },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("auth failed: {0}")]
    AuthFailed(String),
    /// Two live sessions claimed the same id.
    #[error("duplicate session id: {0}")]
    DuplicateSession(u64),
    /// A second handler tried to claim an already-routed kind.
    #[error("kind `{0}` already has a handler")]
    DuplicateHandler(String),
    #[error("session {0} not connected")]
    SessionNotFound(u64),
    #[error("delivery to session {id} failed: {reason}")]
    DeliveryFailed { id: u64, reason: String },
    /// Socket-level failure (connect, read, write, closed).
    #[error("transport: {0}")]
    Transport(String),
    #[error("config: {0}")]
    Config(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl CoplayError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            CoplayError::Decode(_)
            | CoplayError::NestingTooDeep { .. }
            | CoplayError::MissingField { .. }
            | CoplayError::FieldType { .. }
            | CoplayError::BadRequest(_) => ClientCode::BadRequest,
            CoplayError::AuthFailed(_) => ClientCode::AuthFailed,
            CoplayError::SessionNotFound(_) => ClientCode::NotFound,
            CoplayError::DeliveryFailed { .. } | CoplayError::Transport(_) => {
                ClientCode::Unavailable
            }
            CoplayError::Encode(_)
            | CoplayError::DuplicateSession(_)
            | CoplayError::DuplicateHandler(_)
            | CoplayError::Config(_)
            | CoplayError::Internal(_) => ClientCode::Internal,
        }
    }
}
