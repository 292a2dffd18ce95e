//! Per-message context supplied by the host socket layer.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;

// ============================================================================
// MessageExtraInfo
// ============================================================================

/// Context delivered alongside each inbound message.
///
/// Captured once at the WebSocket upgrade and shared by every message
/// on that connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageExtraInfo {
    /// Remote peer address, e.g. `127.0.0.1:53122`.
    pub peer: Option<String>,
    /// Request path of the upgrade request.
    pub path: Option<String>,
    /// Upgrade request headers, keyed by lowercase name.
    pub headers: FxHashMap<String, String>,
}

impl MessageExtraInfo {
    /// Creates an empty info record.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the peer address.
    #[inline]
    #[must_use]
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = Some(peer.into());
        self
    }

    /// Sets the request path.
    #[inline]
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Adds a header; the name is lowercased.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Looks up a header by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

// ============================================================================
// Tests
// ============================================================================
