//! JSON codec for protocol messages.
//!
//! [`JsonCodec`] turns raw WebSocket payloads into validated
//! [`JsonRpcMessage`]s and back.
//!
//! # Design
//!
//! The codec is a marker struct with associated functions: it holds no
//! state, and callers pick formatting per call.
//!
//! # Decoding
//!
//! 1. Binary payloads are read as UTF-8 (invalid sequences become U+FFFD)
//! 2. The text is parsed as generic JSON ([`Error::MalformedJson`] on failure)
//! 3. The value is matched against the four message shapes
//!    ([`Error::SpecViolation`] on mismatch)
//!
//! # Example
//!
//! ```
//! use mcp_ws_transport::codec::JsonCodec;
//!
//! let msg = JsonCodec::decode(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).unwrap();
//! assert_eq!(msg.method(), Some("ping"));
//!
//! let text = JsonCodec::encode(&msg, false).unwrap();
//! assert_eq!(text, r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::borrow::Cow;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::protocol::{
    JsonRpcErrorResponse, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
};

// ============================================================================
// Payload
// ============================================================================

/// A raw inbound frame as delivered by the host socket layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload<'a> {
    /// Text frame.
    Text(&'a str),
    /// Binary frame, expected to hold UTF-8 JSON.
    Binary(&'a [u8]),
}

impl<'a> Payload<'a> {
    /// Returns the payload as text, replacing invalid UTF-8.
    #[must_use]
    pub fn to_text(self) -> Cow<'a, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Binary(bytes) => String::from_utf8_lossy(bytes),
        }
    }

    /// Returns the payload size in bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(bytes) => bytes.len(),
        }
    }

    /// Returns `true` if the payload is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> From<&'a str> for Payload<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for Payload<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a [u8]> for Payload<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Binary(value)
    }
}

impl<'a> From<&'a Vec<u8>> for Payload<'a> {
    fn from(value: &'a Vec<u8>) -> Self {
        Self::Binary(value)
    }
}

// ============================================================================
// Shape
// ============================================================================

/// Which message shape a JSON object claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Request,
    Notification,
    Response,
    Error,
}

impl Shape {
    /// Picks the shape from the discriminating members present.
    fn of(object: &Map<String, Value>) -> Option<Self> {
        if object.contains_key("method") {
            if object.contains_key("id") {
                Some(Self::Request)
            } else {
                Some(Self::Notification)
            }
        } else if object.contains_key("result") {
            Some(Self::Response)
        } else if object.contains_key("error") {
            Some(Self::Error)
        } else {
            None
        }
    }
}

// ============================================================================
// JsonCodec
// ============================================================================

/// JSON encoder/decoder for [`JsonRpcMessage`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    /// Decodes and validates a raw payload.
    ///
    /// # Errors
    ///
    /// - [`Error::MalformedJson`] if the payload is not JSON
    /// - [`Error::SpecViolation`] if the JSON is not a protocol message
    pub fn decode<'a>(payload: impl Into<Payload<'a>>) -> Result<JsonRpcMessage> {
        let text = payload.into().to_text();
        let value: Value =
            serde_json::from_str(&text).map_err(|source| Error::MalformedJson { source })?;

        Self::validate(value)
    }

    /// Validates an already-parsed value against the message shapes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SpecViolation`] carrying `value` if it matches no
    /// shape or breaks the rules of the shape it claims.
    pub fn validate(value: Value) -> Result<JsonRpcMessage> {
        let shape = match value.as_object().map(Shape::of) {
            Some(Some(shape)) => shape,
            Some(None) => {
                return Err(Error::spec_violation(
                    "expected a `method`, `result` or `error` member",
                    value,
                ));
            }
            None => return Err(Error::spec_violation("expected a JSON object", value)),
        };

        let parsed = match shape {
            Shape::Request => JsonRpcRequest::deserialize(&value).map(JsonRpcMessage::from),
            Shape::Notification => {
                JsonRpcNotification::deserialize(&value).map(JsonRpcMessage::from)
            }
            Shape::Response => JsonRpcResponse::deserialize(&value).map(JsonRpcMessage::from),
            Shape::Error => JsonRpcErrorResponse::deserialize(&value).map(JsonRpcMessage::from),
        };

        parsed.map_err(|e| Error::spec_violation(e.to_string(), value))
    }

    /// Serializes a message for transmission.
    ///
    /// `pretty` selects two-space indented output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EncodeFailed`] with the message brief if
    /// serialization fails.
    pub fn encode(message: &JsonRpcMessage, pretty: bool) -> Result<String> {
        let encoded = if pretty {
            serde_json::to_string_pretty(message)
        } else {
            serde_json::to_string(message)
        };

        encoded.map_err(|source| Error::encode_failed(message.brief(), source))
    }
}

// ============================================================================
// Tests
// ============================================================================
