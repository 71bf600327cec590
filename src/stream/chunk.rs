//! The unit of data flowing through a pipeline.
//!
//! Data-mode nodes exchange raw bytes or text; object-mode nodes exchange
//! structured records represented as `serde_json::Value`.

use serde_json::Value;
use std::borrow::Cow;

/// A single piece of data pushed from a producer to its consumers.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    /// Raw bytes (data mode).
    Bytes(Vec<u8>),
    /// UTF-8 text (data mode).
    Text(String),
    /// Structured record (object mode).
    Object(Value),
}

/// How a data-mode chunk was encoded when it was pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Buffer,
    Utf8,
}

impl Chunk {
    /// Whether this chunk carries a structured record.
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, Chunk::Object(_))
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            Chunk::Text(_) => Encoding::Utf8,
            _ => Encoding::Buffer,
        }
    }

    /// Byte view of the chunk. Records are rendered as compact JSON.
    pub fn as_bytes(&self) -> Cow<'_, [u8]> {
        match self {
            Chunk::Bytes(b) => Cow::Borrowed(b),
            Chunk::Text(s) => Cow::Borrowed(s.as_bytes()),
            Chunk::Object(v) => Cow::Owned(v.to_string().into_bytes()),
        }
    }

    /// Text view of the chunk. Invalid UTF-8 is replaced; records are
    /// rendered as JSON, except bare strings which are returned as-is.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Chunk::Bytes(b) => String::from_utf8_lossy(b),
            Chunk::Text(s) => Cow::Borrowed(s),
            Chunk::Object(Value::String(s)) => Cow::Borrowed(s),
            Chunk::Object(v) => Cow::Owned(v.to_string()),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Chunk::Bytes(b) => b,
            Chunk::Text(s) => s.into_bytes(),
            Chunk::Object(v) => v.to_string().into_bytes(),
        }
    }

    /// Convert into a record. Data chunks become JSON strings.
    pub fn into_value(self) -> Value {
        match self {
            Chunk::Object(v) => v,
            Chunk::Text(s) => Value::String(s),
            Chunk::Bytes(b) => Value::String(String::from_utf8_lossy(&b).into_owned()),
        }
    }

    /// Re-wrap text for a node whose readable side runs in the given mode.
    pub fn text_for_mode(text: String, object_mode: bool) -> Chunk {
        if object_mode {
            Chunk::Object(Value::String(text))
        } else {
            Chunk::Text(text)
        }
    }
}

impl From<&str> for Chunk {
    fn from(s: &str) -> Self {
        Chunk::Text(s.to_string())
    }
}

impl From<String> for Chunk {
    fn from(s: String) -> Self {
        Chunk::Text(s)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(b: Vec<u8>) -> Self {
        Chunk::Bytes(b)
    }
}

impl From<Value> for Chunk {
    fn from(v: Value) -> Self {
        Chunk::Object(v)
    }
}

/// Object-mode configuration of a node's two halves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mode {
    pub writable_object_mode: bool,
    pub readable_object_mode: bool,
}

impl Mode {
    /// Both halves in the same mode.
    pub const fn uniform(object_mode: bool) -> Self {
        Self {
            writable_object_mode: object_mode,
            readable_object_mode: object_mode,
        }
    }

    pub const fn object() -> Self {
        Self::uniform(true)
    }

    pub const fn data() -> Self {
        Self::uniform(false)
    }
}
