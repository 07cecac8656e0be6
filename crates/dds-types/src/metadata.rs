//! Opaque per-record metadata.
//!
//! Every metadata-bearing record carries a [`Metadata`] payload whose shape
//! is only known to the tooling that wrote it. The payload is held in one of
//! two forms:
//!
//! - [`Metadata::Value`]: an already-decoded `serde_json::Value`
//! - [`Metadata::Raw`]: undecoded JSON text, kept as-is until a caller asks
//!   for a concrete type with [`as_typed`]
//!
//! Deserializing a `Metadata` from JSON always produces the raw form, so
//! metadata that is only passed through (snapshots, catalog sync) is never
//! decoded at all.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::{TypeError, TypeResult};

/// Opaque metadata payload.
#[derive(Clone)]
pub enum Metadata {
    /// A decoded JSON value.
    Value(Value),
    /// Undecoded JSON text.
    Raw(Box<RawValue>),
}

impl Metadata {
    /// Encode any serializable value as metadata.
    pub fn new<T: Serialize>(value: &T) -> TypeResult<Self> {
        serde_json::to_value(value)
            .map(Self::Value)
            .map_err(|e| TypeError::Serialization(e.to_string()))
    }

    pub fn from_value(value: Value) -> Self {
        Self::Value(value)
    }

    /// Wrap JSON text without decoding it. The text must be valid JSON.
    pub fn from_json(text: impl Into<String>) -> TypeResult<Self> {
        RawValue::from_string(text.into())
            .map(Self::Raw)
            .map_err(|e| TypeError::Decode(e.to_string()))
    }

    /// Metadata holding JSON `null`.
    pub fn null() -> Self {
        Self::Value(Value::Null)
    }

    /// Returns `true` if the payload is still undecoded JSON text.
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }

    /// Decode into a concrete type. See [`as_typed`].
    pub fn decode<T: DeserializeOwned>(&self) -> TypeResult<T> {
        as_typed(self)
    }

    /// The payload as a `serde_json::Value`, decoding raw text if needed.
    pub fn to_value(&self) -> TypeResult<Value> {
        match self {
            Self::Value(value) => Ok(value.clone()),
            Self::Raw(raw) => {
                serde_json::from_str(raw.get()).map_err(|e| TypeError::Decode(e.to_string()))
            }
        }
    }

    /// Compact JSON text of the payload.
    pub fn to_json(&self) -> TypeResult<String> {
        match self {
            Self::Value(value) => {
                serde_json::to_string(value).map_err(|e| TypeError::Serialization(e.to_string()))
            }
            Self::Raw(raw) => Ok(raw.get().to_owned()),
        }
    }
}

/// Convert opaque metadata into a caller-chosen type.
///
/// Both forms go through serde_json: raw text is deserialized directly, a
/// decoded value is serialized and read back, so numbers keep their exact
/// digits either way.
pub fn as_typed<T: DeserializeOwned>(metadata: &Metadata) -> TypeResult<T> {
    match metadata {
        Metadata::Raw(raw) => {
            serde_json::from_str(raw.get()).map_err(|e| TypeError::Decode(e.to_string()))
        }
        Metadata::Value(value) => {
            let bytes = serde_json::to_vec(value)
                .map_err(|e| TypeError::Serialization(e.to_string()))?;
            serde_json::from_slice(&bytes).map_err(|e| TypeError::Decode(e.to_string()))
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::null()
    }
}

impl From<Value> for Metadata {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Two payloads are equal when they decode to the same JSON value,
/// regardless of which form holds them.
impl PartialEq for Metadata {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            _ => match (self.to_value(), other.to_value()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            },
        }
    }
}

impl fmt::Debug for Metadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Raw(raw) => f.debug_tuple("Raw").field(&raw.get()).finish(),
        }
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => value.serialize(serializer),
            Self::Raw(raw) => raw.serialize(serializer),
        }
    }
}

/// Only the serde_json deserializer can produce raw text; other formats are
/// not supported for metadata.
impl<'de> Deserialize<'de> for Metadata {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Box::<RawValue>::deserialize(deserializer).map(Self::Raw)
    }
}
