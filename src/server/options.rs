//! Server configuration.
//!
//! # Example
//!
//! ```
//! use std::net::{IpAddr, Ipv4Addr};
//! use mcp_ws_transport::{ServerOptions, TransportOptions};
//!
//! let options = ServerOptions::new()
//!     .with_ip(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
//!     .with_port(3333)
//!     .with_max_message_size(1 << 20)
//!     .with_transport(TransportOptions::new().with_pretty());
//!
//! assert_eq!(options.port, 3333);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::transport::TransportOptions;

// ============================================================================
// Constants
// ============================================================================

/// Default bind address (localhost).
pub const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

// ============================================================================
// ServerOptions
// ============================================================================

/// Listener and per-connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    /// Address to bind.
    pub ip: IpAddr,

    /// Port to bind (0 lets the OS pick).
    pub port: u16,

    /// Largest inbound message accepted, in bytes. `None` keeps the
    /// WebSocket library default.
    pub max_message_size: Option<usize>,

    /// Options for each connection's transport.
    pub transport: TransportOptions,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ServerOptions {
    /// Creates options for `127.0.0.1` on a random port.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ip: DEFAULT_BIND_IP,
            port: 0,
            max_message_size: None,
            transport: TransportOptions::new(),
        }
    }

    /// Returns the socket address to bind.
    #[inline]
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ServerOptions {
    /// Sets the bind address.
    #[inline]
    #[must_use]
    pub fn with_ip(mut self, ip: IpAddr) -> Self {
        self.ip = ip;
        self
    }

    /// Sets the bind port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Limits inbound message size.
    #[inline]
    #[must_use]
    pub fn with_max_message_size(mut self, bytes: usize) -> Self {
        self.max_message_size = Some(bytes);
        self
    }

    /// Sets the options used for each connection's transport.
    #[inline]
    #[must_use]
    pub fn with_transport(mut self, transport: TransportOptions) -> Self {
        self.transport = transport;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
