//! JSON-RPC 2.0 message types.
//!
//! Four shapes travel over the transport:
//!
//! | Shape | Members |
//! |-------|---------|
//! | [`JsonRpcRequest`] | `jsonrpc`, `id`, `method`, `params?` |
//! | [`JsonRpcNotification`] | `jsonrpc`, `method`, `params?` |
//! | [`JsonRpcResponse`] | `jsonrpc`, `id`, `result` |
//! | [`JsonRpcErrorResponse`] | `jsonrpc`, `id`, `error` |
//!
//! Shapes are strict: a member outside the list is rejected when decoding.
//! The inner `error` object is the exception and keeps unknown members.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::truncate_for_display;

// ============================================================================
// Constants
// ============================================================================

/// The only protocol version accepted in the `jsonrpc` member.
pub const JSONRPC_VERSION: &str = "2.0";

/// Longest id, method or error text kept by [`JsonRpcMessage::brief`].
pub const BRIEF_MAX_CHARS: usize = 64;

// ============================================================================
// JsonRpcVersion
// ============================================================================

/// Marker for the `"jsonrpc": "2.0"` member.
///
/// Serializes as `"2.0"` and refuses any other value when deserializing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct JsonRpcVersion;

impl Serialize for JsonRpcVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(JSONRPC_VERSION)
    }
}

impl<'de> Deserialize<'de> for JsonRpcVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let version = String::deserialize(deserializer)?;
        if version == JSONRPC_VERSION {
            Ok(Self)
        } else {
            Err(de::Error::custom(format!(
                "unsupported jsonrpc version {version:?}, expected \"2.0\""
            )))
        }
    }
}

// ============================================================================
// RequestId
// ============================================================================

/// Correlation identifier: a string or an integer.
///
/// A number with no fractional part (`1.0`) is read as the integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum RequestId {
    /// Integer identifier.
    Number(i64),
    /// String identifier.
    String(String),
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for RequestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RequestIdVisitor)
    }
}

struct RequestIdVisitor;

impl de::Visitor<'_> for RequestIdVisitor {
    type Value = RequestId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string or an integer")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<RequestId, E> {
        Ok(RequestId::Number(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<RequestId, E> {
        i64::try_from(v)
            .map(RequestId::Number)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<RequestId, E> {
        // i64::MAX as f64 rounds up to 2^63, which is out of range
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
            Ok(RequestId::Number(v as i64))
        } else {
            Err(E::invalid_value(de::Unexpected::Float(v), &self))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<RequestId, E> {
        Ok(RequestId::String(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<RequestId, E> {
        Ok(RequestId::String(v))
    }
}

impl From<i64> for RequestId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

// ============================================================================
// Shapes
// ============================================================================

/// A request expecting a response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRpcRequest {
    /// Protocol version marker.
    pub jsonrpc: JsonRpcVersion,
    /// Correlation identifier.
    pub id: RequestId,
    /// Method name.
    pub method: String,
    /// Named parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

/// A one-way message with no identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRpcNotification {
    /// Protocol version marker.
    pub jsonrpc: JsonRpcVersion,
    /// Method name.
    pub method: String,
    /// Named parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

/// A successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRpcResponse {
    /// Protocol version marker.
    pub jsonrpc: JsonRpcVersion,
    /// Identifier of the request being answered.
    pub id: RequestId,
    /// Result payload.
    pub result: Map<String, Value>,
}

/// A failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JsonRpcErrorResponse {
    /// Protocol version marker.
    pub jsonrpc: JsonRpcVersion,
    /// Identifier of the request being answered.
    pub id: RequestId,
    /// Error description.
    pub error: ErrorObject,
}

/// The `error` member of an error response.
///
/// Unlike the envelope, the error object is open: members beyond `code`,
/// `message` and `data` are kept in [`ErrorObject::extra`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// Error code.
    pub code: i64,
    /// Human-readable description.
    pub message: String,
    /// Additional data; an explicit `null` is kept as `Some(Value::Null)`.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub data: Option<Value>,
    /// Any other members.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Distinguishes a member set to `null` from an absent one.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

// ============================================================================
// JsonRpcMessage
// ============================================================================

/// Any message exchanged over the transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum JsonRpcMessage {
    /// Request with id and method.
    Request(JsonRpcRequest),
    /// Notification with method only.
    Notification(JsonRpcNotification),
    /// Response carrying a result.
    Response(JsonRpcResponse),
    /// Response carrying an error.
    Error(JsonRpcErrorResponse),
}

impl JsonRpcMessage {
    /// Creates a request.
    #[must_use]
    pub fn request(
        id: impl Into<RequestId>,
        method: impl Into<String>,
        params: Option<Map<String, Value>>,
    ) -> Self {
        Self::Request(JsonRpcRequest {
            jsonrpc: JsonRpcVersion,
            id: id.into(),
            method: method.into(),
            params,
        })
    }

    /// Creates a notification.
    #[must_use]
    pub fn notification(method: impl Into<String>, params: Option<Map<String, Value>>) -> Self {
        Self::Notification(JsonRpcNotification {
            jsonrpc: JsonRpcVersion,
            method: method.into(),
            params,
        })
    }

    /// Creates a result response.
    #[must_use]
    pub fn response(id: impl Into<RequestId>, result: Map<String, Value>) -> Self {
        Self::Response(JsonRpcResponse {
            jsonrpc: JsonRpcVersion,
            id: id.into(),
            result,
        })
    }

    /// Creates an error response.
    #[must_use]
    pub fn error(id: impl Into<RequestId>, code: i64, message: impl Into<String>) -> Self {
        Self::Error(JsonRpcErrorResponse {
            jsonrpc: JsonRpcVersion,
            id: id.into(),
            error: ErrorObject {
                code,
                message: message.into(),
                data: None,
                extra: Map::new(),
            },
        })
    }

    /// Returns the correlation id, if the shape has one.
    #[must_use]
    pub fn id(&self) -> Option<&RequestId> {
        match self {
            Self::Request(r) => Some(&r.id),
            Self::Response(r) => Some(&r.id),
            Self::Error(r) => Some(&r.id),
            Self::Notification(_) => None,
        }
    }

    /// Returns the method name, if the shape has one.
    #[must_use]
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(r) => Some(&r.method),
            Self::Notification(n) => Some(&n.method),
            Self::Response(_) | Self::Error(_) => None,
        }
    }

    /// Returns a one-line summary without the payload.
    ///
    /// Used in error messages where the full message could be large.
    #[must_use]
    pub fn brief(&self) -> String {
        let short = |text: &str| truncate_for_display(text, BRIEF_MAX_CHARS);
        match self {
            Self::Request(r) => format!(
                "Request [{}]:({})",
                short(&r.id.to_string()),
                short(&r.method)
            ),
            Self::Response(r) => format!("Response Result [{}]", short(&r.id.to_string())),
            Self::Error(r) => format!(
                "Response Error [{}] {}",
                short(&r.id.to_string()),
                short(&r.error.message)
            ),
            Self::Notification(n) => format!("Notification ({})", short(&n.method)),
        }
    }
}

impl From<JsonRpcRequest> for JsonRpcMessage {
    fn from(value: JsonRpcRequest) -> Self {
        Self::Request(value)
    }
}

impl From<JsonRpcNotification> for JsonRpcMessage {
    fn from(value: JsonRpcNotification) -> Self {
        Self::Notification(value)
    }
}

impl From<JsonRpcResponse> for JsonRpcMessage {
    fn from(value: JsonRpcResponse) -> Self {
        Self::Response(value)
    }
}

impl From<JsonRpcErrorResponse> for JsonRpcMessage {
    fn from(value: JsonRpcErrorResponse) -> Self {
        Self::Error(value)
    }
}

// ============================================================================
// Tests
// ============================================================================
