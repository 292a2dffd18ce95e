//! Error types for the WebSocket transport.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use mcp_ws_transport::{Error, ErrorKind, Result};
//!
//! async fn example(transport: &WebSocketServerTransport, msg: &JsonRpcMessage) -> Result<()> {
//!     if let Err(e) = transport.send(msg).await {
//!         if e.kind() == ErrorKind::SocketDead {
//!             // peer went away, drop the session
//!         }
//!         return Err(e);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Transport | [`Error::IllegalRebind`], [`Error::ConnectMissing`], [`Error::SocketDead`], [`Error::TransmitFailed`], [`Error::Closed`] |
//! | Serialization | [`Error::MalformedJson`], [`Error::SpecViolation`], [`Error::EncodeFailed`] |
//! | Catch-all | [`Error::Unknown`] |
//! | External | [`Error::Io`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::io::Error as IoError;
use std::result::Result as StdResult;

use serde_json::Value;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::transport::{BoxError, ReadyState};

// ============================================================================
// Constants
// ============================================================================

/// Default number of payload characters shown in error messages.
pub const DEFAULT_MAX_DISPLAY_CHARS: usize = 4_000;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// ErrorKind
// ============================================================================

/// Classification tag for an [`enum@Error`].
///
/// Stable, comparable, and cheap to copy; use it to branch on failures
/// without matching on variant fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Mount attempted with a different connection than the bound one.
    IllegalRebind,
    /// Live connection required but none is bound.
    ConnectMissing,
    /// Bound connection is not in the open state.
    SocketDead,
    /// The socket write itself failed.
    TransmitFailed,
    /// Inbound payload failed to parse as JSON.
    MalformedJson,
    /// Inbound JSON is not a valid protocol message.
    SpecViolation,
    /// Outbound message failed to serialize.
    EncodeFailed,
    /// Catch-all wrapping an unexpected cause.
    Unknown,
    /// Operation attempted on a closed transport.
    Closed,
    /// Listener I/O failure.
    Io,
    /// WebSocket handshake or protocol failure.
    WebSocket,
}

impl ErrorKind {
    /// Returns the wire-style tag, e.g. `"SOCKET_DEAD"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IllegalRebind => "ILLEGAL_REBIND",
            Self::ConnectMissing => "CONNECT_MISSING",
            Self::SocketDead => "SOCKET_DEAD",
            Self::TransmitFailed => "TRANSMIT_FAILED",
            Self::MalformedJson => "MALFORMED_JSON",
            Self::SpecViolation => "MCP_SPEC_VIOLATION",
            Self::EncodeFailed => "ENCODE_FAILED",
            Self::Unknown => "UNKNOWN",
            Self::Closed => "TRANSPORT_CLOSED",
            Self::Io => "IO",
            Self::WebSocket => "WEBSOCKET",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant carries the context needed to diagnose the failure
/// without access to the connection that produced it.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// A different connection was mounted onto a bound transport.
    #[error(
        "Illegal rebind rejected.\n\nCurrent peer: {current}\nIncoming peer: {incoming}\n\nRule: one transport instance per connection."
    )]
    IllegalRebind {
        /// Peer of the connection already bound.
        current: String,
        /// Peer of the rejected connection.
        incoming: String,
    },

    /// No connection is bound (never mounted, or cleared by close).
    #[error("WebSocket connection is missing (transport not mounted)")]
    ConnectMissing,

    /// The bound connection is not open.
    #[error("WebSocket is not open.\n\nPeer: {peer}\nreadyState: {ready_state}")]
    SocketDead {
        /// Peer of the bound connection.
        peer: String,
        /// Ready state observed at the time of the check.
        ready_state: ReadyState,
    },

    /// Writing to the socket failed.
    #[error("Failed to transmit message over WebSocket.\n\npayload ({payload_len} chars):\n{payload}")]
    TransmitFailed {
        /// Character count of the full payload.
        payload_len: usize,
        /// Payload, truncated for display.
        payload: String,
        /// Underlying socket failure.
        #[source]
        source: BoxError,
    },

    /// The transport was closed and cannot be reused.
    #[error("Transport is closed (one transport instance per connection)")]
    Closed,

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// Inbound payload is not JSON.
    #[error("Received malformed JSON (failed to parse incoming message)")]
    MalformedJson {
        /// Parser failure.
        #[source]
        source: serde_json::Error,
    },

    /// Inbound JSON does not match any protocol message shape.
    #[error("Incoming message is not a valid JSON-RPC / MCP message: {reason}")]
    SpecViolation {
        /// Why validation rejected the value.
        reason: String,
        /// The offending value.
        value: Value,
    },

    /// Outbound message could not be serialized.
    #[error(
        "Failed to encode JSON-RPC message.\n\nMessage: {brief}\n\nHint: this usually happens when the message contains values JSON cannot represent."
    )]
    EncodeFailed {
        /// Short summary of the message (id and method or kind).
        brief: String,
        /// Serializer failure.
        #[source]
        source: serde_json::Error,
    },

    // ========================================================================
    // Catch-all
    // ========================================================================
    /// Unexpected failure wrapped with a description.
    #[error("Transport error: {message}")]
    Unknown {
        /// What was being attempted.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an illegal rebind error.
    #[inline]
    pub fn illegal_rebind(current: impl Into<String>, incoming: impl Into<String>) -> Self {
        Self::IllegalRebind {
            current: current.into(),
            incoming: incoming.into(),
        }
    }

    /// Creates a socket dead error.
    #[inline]
    pub fn socket_dead(peer: impl Into<String>, ready_state: ReadyState) -> Self {
        Self::SocketDead {
            peer: peer.into(),
            ready_state,
        }
    }

    /// Creates a transmit failed error, truncating the payload to
    /// `max_display_chars` characters.
    pub fn transmit_failed(payload: &str, max_display_chars: usize, source: BoxError) -> Self {
        Self::TransmitFailed {
            payload_len: payload.chars().count(),
            payload: truncate_for_display(payload, max_display_chars),
            source,
        }
    }

    /// Creates a spec violation error.
    #[inline]
    pub fn spec_violation(reason: impl Into<String>, value: Value) -> Self {
        Self::SpecViolation {
            reason: reason.into(),
            value,
        }
    }

    /// Creates an encode failed error.
    #[inline]
    pub fn encode_failed(brief: impl Into<String>, source: serde_json::Error) -> Self {
        Self::EncodeFailed {
            brief: brief.into(),
            source,
        }
    }

    /// Creates an unknown error without a cause.
    #[inline]
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unknown error wrapping `cause`.
    #[inline]
    pub fn unknown_with(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::Unknown {
            message: message.into(),
            source: Some(cause.into()),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the classification tag.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalRebind { .. } => ErrorKind::IllegalRebind,
            Self::ConnectMissing => ErrorKind::ConnectMissing,
            Self::SocketDead { .. } => ErrorKind::SocketDead,
            Self::TransmitFailed { .. } => ErrorKind::TransmitFailed,
            Self::Closed => ErrorKind::Closed,
            Self::MalformedJson { .. } => ErrorKind::MalformedJson,
            Self::SpecViolation { .. } => ErrorKind::SpecViolation,
            Self::EncodeFailed { .. } => ErrorKind::EncodeFailed,
            Self::Unknown { .. } => ErrorKind::Unknown,
            Self::Io(_) => ErrorKind::Io,
            Self::WebSocket(_) => ErrorKind::WebSocket,
        }
    }

    /// Returns `true` if this is a transport-layer error.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::IllegalRebind { .. }
                | Self::ConnectMissing
                | Self::SocketDead { .. }
                | Self::TransmitFailed { .. }
                | Self::Closed
        )
    }

    /// Returns `true` if this is a serialization-layer error.
    #[inline]
    #[must_use]
    pub fn is_serialization_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedJson { .. } | Self::SpecViolation { .. } | Self::EncodeFailed { .. }
        )
    }

    /// Returns `true` if closing a transport that fails this way is
    /// not exceptional (already dead or never connected).
    #[inline]
    #[must_use]
    pub fn is_benign_on_close(&self) -> bool {
        matches!(self, Self::SocketDead { .. } | Self::ConnectMissing)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Truncates `text` to at most `max_chars` characters, appending a line
/// with the number of characters left out.
#[must_use]
pub fn truncate_for_display(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_owned(),
        Some((cut, _)) => {
            let hidden = text[cut..].chars().count();
            format!("{}\n... ({hidden} more chars)", &text[..cut])
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
