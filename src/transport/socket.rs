//! Host socket abstraction.
//!
//! The transport never owns a socket. The host layer (for example
//! [`crate::server`]) owns it and hands the transport an `Arc` to
//! downgrade; every use goes through a readiness check first.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// Types
// ============================================================================

/// Boxed error returned by host socket operations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// ReadyState
// ============================================================================

/// Lifecycle stage of a socket, numbered like the WebSocket `readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ReadyState {
    /// Handshake still in progress.
    Connecting = 0,
    /// Ready to send and receive.
    Open = 1,
    /// Close handshake started.
    Closing = 2,
    /// Closed or gone.
    Closed = 3,
}

impl ReadyState {
    /// Converts from the numeric representation; unknown values map to
    /// [`ReadyState::Closed`].
    #[inline]
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Connecting,
            1 => Self::Open,
            2 => Self::Closing,
            _ => Self::Closed,
        }
    }

    /// Returns the numeric representation.
    #[inline]
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns `true` if the socket can carry messages.
    #[inline]
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Connecting => "CONNECTING",
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::Closed => "CLOSED",
        };
        write!(f, "{} ({name})", self.as_u8())
    }
}

// ============================================================================
// Socket
// ============================================================================

/// A bidirectional message socket owned by the host runtime.
///
/// Writes are synchronous from the caller's view: implementations queue
/// or write immediately and report failure through the return value.
pub trait Socket: Send + Sync {
    /// Human-readable peer description, e.g. `127.0.0.1:53122`.
    fn peer(&self) -> String;

    /// Current readiness.
    fn ready_state(&self) -> ReadyState;

    /// Writes one text frame.
    ///
    /// # Errors
    ///
    /// Returns the host failure if the frame cannot be written.
    fn send(&self, payload: &str) -> Result<(), BoxError>;

    /// Starts a normal close.
    ///
    /// # Errors
    ///
    /// Returns the host failure if the close cannot be initiated.
    fn close(&self) -> Result<(), BoxError>;
}

// ============================================================================
// Tests
// ============================================================================
