//! Message kind catalog.
//!
//! Every concrete kind is a thin wrapper over [`Envelope`]: its constructor
//! writes the kind tag and a fixed field order, its accessors read the fields
//! back and fail with `MissingField`/`FieldType` rather than inventing
//! defaults. [`Message::from_envelope`] is the single kind → wrapper table
//! used after decoding; adding a kind means one variant and one match arm.

use std::fmt;

use crate::error::{CoplayError, Result};
use crate::protocol::envelope::Envelope;
use crate::protocol::value::{Payload, UserRef, Value, WorldDelta};

/// Closed set of routed message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageKind {
    Login,
    GameWorld,
    Response,
    ServerChat,
    PrivateChat,
    Chat,
    Request,
    Data,
    GameSpeed,
}

impl MessageKind {
    pub const ALL: [MessageKind; 9] = [
        MessageKind::Login,
        MessageKind::GameWorld,
        MessageKind::Response,
        MessageKind::ServerChat,
        MessageKind::PrivateChat,
        MessageKind::Chat,
        MessageKind::Request,
        MessageKind::Data,
        MessageKind::GameSpeed,
    ];

    /// Wire tag.
    pub fn tag(self) -> &'static str {
        match self {
            MessageKind::Login => "login",
            MessageKind::GameWorld => "gameworld",
            MessageKind::Response => "response",
            MessageKind::ServerChat => "serverchat",
            MessageKind::PrivateChat => "pm",
            MessageKind::Chat => "chat",
            MessageKind::Request => "request",
            MessageKind::Data => "data",
            MessageKind::GameSpeed => "gamespeed",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Generates the envelope plumbing shared by every concrete kind.
macro_rules! envelope_kind {
    ($(#[$meta:meta])* $name:ident, $kind:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name(Envelope);

        impl $name {
            pub const KIND: MessageKind = $kind;

            fn empty() -> Self {
                Self(Envelope::new($kind.tag()))
            }

            pub fn envelope(&self) -> &Envelope {
                &self.0
            }

            pub fn into_envelope(self) -> Envelope {
                self.0
            }
        }

        impl From<$name> for Envelope {
            fn from(m: $name) -> Envelope {
                m.0
            }
        }
    };
}

envelope_kind!(
    /// Client → server login request.
    Login,
    MessageKind::Login
);
envelope_kind!(
    /// World delta, sent by either side.
    GameWorld,
    MessageKind::GameWorld
);
envelope_kind!(
    /// Server reply to a login or request.
    Response,
    MessageKind::Response
);
envelope_kind!(
    /// Server-originated chat line.
    ServerChat,
    MessageKind::ServerChat
);
envelope_kind!(
    /// Directed chat to a single session.
    PrivateChat,
    MessageKind::PrivateChat
);
envelope_kind!(
    /// Chat to every session.
    Chat,
    MessageKind::Chat
);
envelope_kind!(
    /// Named client request (`userlist`, `gameworld`, `save`).
    Request,
    MessageKind::Request
);
envelope_kind!(
    /// Free-form key/value message.
    Data,
    MessageKind::Data
);
envelope_kind!(
    /// Game speed set or vote.
    GameSpeed,
    MessageKind::GameSpeed
);

impl Login {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        unique_id: impl Into<String>,
    ) -> Self {
        let mut m = Self::empty();
        m.0.insert("username", Value::Str(username.into()))
            .insert("password", Value::Str(password.into()))
            .insert("uniqueid", Value::Str(unique_id.into()));
        m
    }

    pub fn username(&self) -> Result<&str> {
        self.0.str_field("username")
    }

    pub fn password(&self) -> Result<&str> {
        self.0.str_field("password")
    }

    pub fn unique_id(&self) -> Result<&str> {
        self.0.str_field("uniqueid")
    }
}

impl GameWorld {
    pub fn new(changes: WorldDelta, addition: bool) -> Self {
        let mut m = Self::empty();
        m.0.insert("addition", addition).insert("changes", changes);
        m
    }

    pub fn is_addition(&self) -> Result<bool> {
        self.0.bool_field("addition")
    }

    pub fn changes(&self) -> Result<&WorldDelta> {
        self.0.world_field("changes")
    }
}

impl Response {
    pub fn new(response_type: impl Into<String>, data: impl Into<Value>) -> Self {
        let mut m = Self::empty();
        m.0.insert("type", Value::Str(response_type.into())).insert("data", data);
        m
    }

    pub fn response_type(&self) -> Result<&str> {
        self.0.str_field("type")
    }

    /// Any value, including null.
    pub fn data(&self) -> Result<&Value> {
        self.0.field("data")
    }
}

/// Severity of a server chat line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerChatType {
    Info,
    Error,
    Warn,
}

impl ServerChatType {
    pub fn as_str(self) -> &'static str {
        match self {
            ServerChatType::Info => "Info",
            ServerChatType::Error => "Error",
            ServerChatType::Warn => "Warn",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Info" => Some(ServerChatType::Info),
            "Error" => Some(ServerChatType::Error),
            "Warn" => Some(ServerChatType::Warn),
            _ => None,
        }
    }
}

impl ServerChat {
    pub fn new(message: impl Into<String>, chat_type: ServerChatType) -> Self {
        let mut m = Self::empty();
        m.0.insert("message", Value::Str(message.into()))
            .insert("type", chat_type.as_str());
        m
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, ServerChatType::Info)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, ServerChatType::Error)
    }

    pub fn message(&self) -> Result<&str> {
        self.0.str_field("message")
    }

    pub fn chat_type(&self) -> Result<ServerChatType> {
        let raw = self.0.str_field("type")?;
        ServerChatType::parse(raw).ok_or_else(|| CoplayError::FieldType {
            kind: self.0.kind().to_owned(),
            field: "type",
            expected: "Info, Error or Warn",
        })
    }
}

impl PrivateChat {
    /// `receiver` is the target session id in text form.
    pub fn new(sender: UserRef, receiver: impl Into<String>, message: impl Into<String>) -> Self {
        let mut m = Self::empty();
        m.0.insert("sender", sender)
            .insert("receiver", Value::Str(receiver.into()))
            .insert("message", Value::Str(message.into()));
        m
    }

    pub fn sender(&self) -> Result<&UserRef> {
        self.0.user_field("sender")
    }

    pub fn receiver(&self) -> Result<&str> {
        self.0.str_field("receiver")
    }

    pub fn message(&self) -> Result<&str> {
        self.0.str_field("message")
    }
}

impl Chat {
    /// Broadcast chat. `receiver` is always written as null.
    pub fn new(message: impl Into<String>, sender: Option<UserRef>) -> Self {
        let mut m = Self::empty();
        m.0.insert("sender", sender)
            .insert("receiver", Value::Null)
            .insert("message", Value::Str(message.into()));
        m
    }

    pub fn sender(&self) -> Result<Option<&UserRef>> {
        self.0.nullable_user_field("sender")
    }

    pub fn message(&self) -> Result<&str> {
        self.0.str_field("message")
    }
}

impl Request {
    pub fn new(request: impl Into<String>) -> Self {
        let mut m = Self::empty();
        m.0.insert("request", Value::Str(request.into()));
        m
    }

    pub fn request(&self) -> Result<&str> {
        self.0.str_field("request")
    }
}

impl Data {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut m = Self::empty();
        m.0.insert(key, value);
        m
    }

    /// Every pair is kept, in iteration order.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut m = Self::empty();
        m.0.replace_payload(pairs.into_iter().collect());
        m
    }

    /// Builds from `"key|value"` strings.
    ///
    /// Each entry resets the payload before inserting, so only the last pair
    /// survives. Existing peers depend on this layout; use [`Data::from_pairs`]
    /// to keep every pair.
    pub fn from_key_values(key_values: &[&str]) -> Result<Self> {
        let mut m = Self::empty();
        for kv in key_values {
            let mut parts = kv.split('|');
            let (Some(k), Some(v)) = (parts.next(), parts.next()) else {
                return Err(CoplayError::BadRequest(format!(
                    "data entry `{kv}` is not `key|value`"
                )));
            };
            m.0.replace_payload(Payload::new().with(k, v));
        }
        Ok(m)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.payload().get(key)
    }

    pub fn pairs(&self) -> &Payload {
        self.0.payload()
    }
}

/// Highest game speed step (speeds are 0..=4).
pub const MAX_GAME_SPEED: u8 = 4;

/// Whether a game speed message is authoritative or a vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedMode {
    /// Server/admin sets the speed directly (wire value 0).
    Set,
    /// A player asks for a speed (wire value 1).
    Vote,
}

impl SpeedMode {
    pub fn code(self) -> i64 {
        match self {
            SpeedMode::Set => 0,
            SpeedMode::Vote => 1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(SpeedMode::Set),
            1 => Some(SpeedMode::Vote),
            _ => None,
        }
    }
}

impl GameSpeed {
    pub fn new(speed: u8, mode: SpeedMode) -> Self {
        let mut m = Self::empty();
        m.0.insert("type", mode.code())
            .insert("speed", i64::from(speed));
        m
    }

    pub fn mode(&self) -> Result<SpeedMode> {
        let code = self.0.int_field("type")?;
        SpeedMode::from_code(code).ok_or_else(|| CoplayError::FieldType {
            kind: self.0.kind().to_owned(),
            field: "type",
            expected: "0 (set) or 1 (vote)",
        })
    }

    pub fn speed(&self) -> Result<u8> {
        let raw = self.0.int_field("speed")?;
        u8::try_from(raw)
            .ok()
            .filter(|s| *s <= MAX_GAME_SPEED)
            .ok_or_else(|| CoplayError::FieldType {
                kind: self.0.kind().to_owned(),
                field: "speed",
                expected: "int in 0..=4",
            })
    }
}

/// Decoded message: one variant per catalog kind, plus the generic fallback
/// for tags this build does not know.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Login(Login),
    GameWorld(GameWorld),
    Response(Response),
    ServerChat(ServerChat),
    PrivateChat(PrivateChat),
    Chat(Chat),
    Request(Request),
    Data(Data),
    GameSpeed(GameSpeed),
    Unknown(Envelope),
}

impl Message {
    /// Select the concrete kind from the envelope's tag.
    pub fn from_envelope(env: Envelope) -> Self {
        match MessageKind::from_tag(env.kind()) {
            Some(MessageKind::Login) => Message::Login(Login(env)),
            Some(MessageKind::GameWorld) => Message::GameWorld(GameWorld(env)),
            Some(MessageKind::Response) => Message::Response(Response(env)),
            Some(MessageKind::ServerChat) => Message::ServerChat(ServerChat(env)),
            Some(MessageKind::PrivateChat) => Message::PrivateChat(PrivateChat(env)),
            Some(MessageKind::Chat) => Message::Chat(Chat(env)),
            Some(MessageKind::Request) => Message::Request(Request(env)),
            Some(MessageKind::Data) => Message::Data(Data(env)),
            Some(MessageKind::GameSpeed) => Message::GameSpeed(GameSpeed(env)),
            None => Message::Unknown(env),
        }
    }

    /// `None` for unknown tags.
    pub fn kind(&self) -> Option<MessageKind> {
        MessageKind::from_tag(self.envelope().kind())
    }

    pub fn envelope(&self) -> &Envelope {
        match self {
            Message::Login(m) => m.envelope(),
            Message::GameWorld(m) => m.envelope(),
            Message::Response(m) => m.envelope(),
            Message::ServerChat(m) => m.envelope(),
            Message::PrivateChat(m) => m.envelope(),
            Message::Chat(m) => m.envelope(),
            Message::Request(m) => m.envelope(),
            Message::Data(m) => m.envelope(),
            Message::GameSpeed(m) => m.envelope(),
            Message::Unknown(env) => env,
        }
    }

    pub fn into_envelope(self) -> Envelope {
        match self {
            Message::Login(m) => m.into_envelope(),
            Message::GameWorld(m) => m.into_envelope(),
            Message::Response(m) => m.into_envelope(),
            Message::ServerChat(m) => m.into_envelope(),
            Message::PrivateChat(m) => m.into_envelope(),
            Message::Chat(m) => m.into_envelope(),
            Message::Request(m) => m.into_envelope(),
            Message::Data(m) => m.into_envelope(),
            Message::GameSpeed(m) => m.into_envelope(),
            Message::Unknown(env) => env,
        }
    }
}
