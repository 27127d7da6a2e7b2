//! Payload values: an ordered key/value container plus the tagged value union.
//!
//! `Payload` keeps insertion order; a repeated key overwrites in place so the
//! field keeps the position it was first given. `Value` is adjacently tagged
//! on the wire (`{"t":"int","v":3}`) so integers, floats, nested maps and
//! domain objects never collapse into one another.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stable per-connection identity. `0` is reserved for the server itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Sentinel id used as the sender of server-synthesized messages.
    pub const SERVER: SessionId = SessionId(0);

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(SessionId)
    }
}

/// Reference to a connected user as carried inside messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserRef {
    pub id: SessionId,
    pub name: String,
}

impl UserRef {
    pub fn new(id: SessionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The server pseudo-user (id 0).
    pub fn server() -> Self {
        Self::new(SessionId::SERVER, "Server")
    }
}

/// A set of world entries to add (or remove) from the shared game world.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldDelta {
    pub entries: Payload,
}

impl WorldDelta {
    pub fn new(entries: Payload) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Heterogeneous payload value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "snake_case")]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(Payload),
    User(UserRef),
    World(WorldDelta),
}

impl Value {
    /// Human-readable variant name, used in field type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::User(_) => "user",
            Value::World(_) => "world",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&UserRef> {
        match self {
            Value::User(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_world(&self) -> Option<&WorldDelta> {
        match self {
            Value::World(w) => Some(w),
            _ => None,
        }
    }

    /// Container nesting depth. Scalars are 0, a container is one more than
    /// its deepest child.
    pub fn depth(&self) -> usize {
        match self {
            Value::List(items) => 1 + items.iter().map(Value::depth).max().unwrap_or(0),
            Value::Map(p) => 1 + p.depth(),
            Value::World(w) => 1 + w.entries.depth(),
            Value::User(_) => 1,
            _ => 0,
        }
    }

    /// `false` if any float anywhere in the value is NaN or infinite.
    pub(crate) fn is_finite(&self) -> bool {
        match self {
            Value::Float(f) => f.is_finite(),
            Value::List(items) => items.iter().all(Value::is_finite),
            Value::Map(p) => p.is_finite(),
            Value::World(w) => w.entries.is_finite(),
            _ => true,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Payload> for Value {
    fn from(v: Payload) -> Self {
        Value::Map(v)
    }
}

impl From<UserRef> for Value {
    fn from(v: UserRef) -> Self {
        Value::User(v)
    }
}

impl From<WorldDelta> for Value {
    fn from(v: WorldDelta) -> Self {
        Value::World(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Ordered key/value body of an envelope. Keys keep first-insertion order;
/// lookups and inserts are O(1).
#[derive(Debug, Clone, Default)]
pub struct Payload {
    entries: IndexMap<String, Value>,
}

impl PartialEq for Payload {
    /// Order-sensitive: the same pairs in a different order encode differently.
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.entries.iter().eq(other.entries.iter())
    }
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An existing key keeps its position; the previous
    /// value is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Remove a key; the remaining entries keep their order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Deepest value nesting inside this payload (0 when all values are scalars).
    pub fn depth(&self) -> usize {
        self.entries.values().map(Value::depth).max().unwrap_or(0)
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.entries.values().all(Value::is_finite)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut p = Payload::new();
        for (k, v) in iter {
            p.insert(k, v);
        }
        p
    }
}

impl IntoIterator for Payload {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(PayloadVisitor)
    }
}

struct PayloadVisitor;

impl<'de> Visitor<'de> for PayloadVisitor {
    type Value = Payload;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of tagged values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Payload, A::Error> {
        let mut payload = Payload {
            entries: IndexMap::with_capacity(access.size_hint().unwrap_or(0).min(4096)),
        };
        while let Some((k, v)) = access.next_entry::<String, Value>()? {
            payload.insert(k, v);
        }
        Ok(payload)
    }
}
