//! Transport configuration.
//!
//! # Example
//!
//! ```
//! use mcp_ws_transport::TransportOptions;
//!
//! let options = TransportOptions::new()
//!     .with_pretty()
//!     .with_max_display_chars(512);
//!
//! assert!(options.pretty);
//! assert_eq!(options.max_display_chars, 512);
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::error::DEFAULT_MAX_DISPLAY_CHARS;

// ============================================================================
// TransportOptions
// ============================================================================

/// Per-transport settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Encode outbound messages with two-space indentation.
    pub pretty: bool,

    /// Maximum payload characters kept in [`crate::Error::TransmitFailed`].
    pub max_display_chars: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl TransportOptions {
    /// Creates options with compact encoding and the default display limit.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pretty: false,
            max_display_chars: DEFAULT_MAX_DISPLAY_CHARS,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl TransportOptions {
    /// Enables pretty-printed outbound JSON.
    #[inline]
    #[must_use]
    pub fn with_pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Sets the payload display limit for transmit errors.
    #[inline]
    #[must_use]
    pub fn with_max_display_chars(mut self, max: usize) -> Self {
        self.max_display_chars = max;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
