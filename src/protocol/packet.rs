//! Packet decoding and encoding.
//!
//! A frame whose text starts with `{` and ends with `}` is parsed as a JSON
//! object; anything else is passed through as raw text.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde_json::{Map, Value};

use crate::error::{Error, Result};

// ============================================================================
// Packet
// ============================================================================

/// Decoded application-level payload of a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    /// JSON object payload.
    Json(Map<String, Value>),
    /// Opaque text payload.
    Text(String),
}

impl Packet {
    /// Decodes the text of one inbound frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the text looks like a JSON object but
    /// does not parse as one.
    pub fn decode(text: &str) -> Result<Self> {
        if !is_json_shaped(text) {
            return Ok(Self::Text(text.to_owned()));
        }

        serde_json::from_str::<Map<String, Value>>(text)
            .map(Self::Json)
            .map_err(|e| Error::decode(format!("unable to parse data: {e}")))
    }

    /// Serializes the packet to the text sent on the wire.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn encode(&self) -> Result<String> {
        match self {
            Self::Json(map) => Ok(serde_json::to_string(map)?),
            Self::Text(text) => Ok(text.clone()),
        }
    }

    /// Returns the JSON object, if this is a structured packet.
    #[inline]
    #[must_use]
    pub fn as_json(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Json(map) => Some(map),
            Self::Text(_) => None,
        }
    }

    /// Returns the raw text, if this is a text packet.
    #[inline]
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Json(_) => None,
            Self::Text(text) => Some(text),
        }
    }

    /// Returns `true` for structured packets.
    #[inline]
    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json(_))
    }
}

/// Structural check used to decide whether to parse as JSON.
#[inline]
fn is_json_shaped(text: &str) -> bool {
    text.starts_with('{') && text.ends_with('}')
}

// ============================================================================
// Conversions
// ============================================================================

impl From<Map<String, Value>> for Packet {
    fn from(map: Map<String, Value>) -> Self {
        Self::Json(map)
    }
}

impl From<String> for Packet {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Packet {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl TryFrom<Value> for Packet {
    type Error = Error;

    /// Objects become [`Packet::Json`], strings become [`Packet::Text`].
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self::Json(map)),
            Value::String(text) => Ok(Self::Text(text)),
            other => Err(Error::config(format!(
                "packet must be a JSON object or string, got {other}"
            ))),
        }
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(map) => match serde_json::to_string(map) {
                Ok(text) => f.write_str(&text),
                Err(_) => f.write_str("<unserializable>"),
            },
            Self::Text(text) => f.write_str(text),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
