//! Generic wire message: a kind tag plus an ordered payload.

use serde::{Deserialize, Serialize};

use crate::error::{CoplayError, Result};
use crate::protocol::value::{Payload, UserRef, Value, WorldDelta};

/// Self-describing envelope. The kind tag is fixed at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    kind: String,
    #[serde(default)]
    payload: Payload,
}

impl Envelope {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            payload: Payload::new(),
        }
    }

    pub fn with_payload(kind: impl Into<String>, payload: Payload) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Set a payload field; last write wins.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.payload.insert(key, value);
        self
    }

    pub(crate) fn replace_payload(&mut self, payload: Payload) {
        self.payload = payload;
    }

    // --------------------
    // Required-field readers used by the typed kinds
    // --------------------

    pub(crate) fn field(&self, field: &'static str) -> Result<&Value> {
        self.payload.get(field).ok_or_else(|| CoplayError::MissingField {
            kind: self.kind.clone(),
            field,
        })
    }

    fn type_error(&self, field: &'static str, expected: &'static str) -> CoplayError {
        CoplayError::FieldType {
            kind: self.kind.clone(),
            field,
            expected,
        }
    }

    pub(crate) fn str_field(&self, field: &'static str) -> Result<&str> {
        self.field(field)?
            .as_str()
            .ok_or_else(|| self.type_error(field, "string"))
    }

    pub(crate) fn bool_field(&self, field: &'static str) -> Result<bool> {
        self.field(field)?
            .as_bool()
            .ok_or_else(|| self.type_error(field, "bool"))
    }

    pub(crate) fn int_field(&self, field: &'static str) -> Result<i64> {
        self.field(field)?
            .as_i64()
            .ok_or_else(|| self.type_error(field, "int"))
    }

    pub(crate) fn user_field(&self, field: &'static str) -> Result<&UserRef> {
        self.field(field)?
            .as_user()
            .ok_or_else(|| self.type_error(field, "user"))
    }

    /// Present but allowed to be null.
    pub(crate) fn nullable_user_field(&self, field: &'static str) -> Result<Option<&UserRef>> {
        match self.field(field)? {
            Value::Null => Ok(None),
            Value::User(u) => Ok(Some(u)),
            _ => Err(self.type_error(field, "user or null")),
        }
    }

    pub(crate) fn world_field(&self, field: &'static str) -> Result<&WorldDelta> {
        self.field(field)?
            .as_world()
            .ok_or_else(|| self.type_error(field, "world"))
    }
}
