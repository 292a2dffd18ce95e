//! Transport layer.
//!
//! This module adapts a host-owned WebSocket to the message-oriented
//! contract an RPC engine programs against.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐   handle_message    ┌───────────────────────────┐   on message   ┌────────────┐
//! │  Host socket     │ ──────────────────► │  WebSocketServerTransport │ ─────────────► │ RPC engine │
//! │  layer           │   handle_close      │   Binder + JsonCodec      │                │            │
//! │  (owns Socket)   │ ◄────────────────── │                           │ ◄───────────── │            │
//! └──────────────────┘   Socket::send      └───────────────────────────┘   send / close └────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. Host accepts a connection and creates one transport for it
//! 2. `mount` binds the socket (weakly; the host keeps ownership)
//! 3. `start` activates the transport and assigns the session ID
//! 4. Inbound frames flow through `handle_message`, outbound through `send`
//! 5. `close` or `handle_close` ends the transport; the close handler fires once
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `adapter` | [`WebSocketServerTransport`] |
//! | `binder` | One-connection-per-transport enforcement |
//! | `options` | [`TransportOptions`] |
//! | `socket` | [`Socket`] trait and [`ReadyState`] |

// ============================================================================
// Submodules
// ============================================================================

/// The transport façade.
pub mod adapter;

/// Connection binder.
pub mod binder;

/// Transport configuration.
pub mod options;

/// Host socket abstraction.
pub mod socket;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use adapter::{
    CloseHandler, ErrorHandler, MessageHandler, TransportState, WebSocketServerTransport,
};
pub use binder::Binder;
pub use options::TransportOptions;
pub use socket::{BoxError, ReadyState, Socket};

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;

use crate::error::Result;
use crate::identifiers::SessionId;
use crate::protocol::JsonRpcMessage;

// ============================================================================
// Transport
// ============================================================================

/// Contract between a transport and the RPC engine that drives it.
///
/// Engines hold an `Arc<dyn Transport>` and never see the socket.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Activates the transport.
    async fn start(&self) -> Result<()>;

    /// Sends one message.
    async fn send(&self, message: &JsonRpcMessage) -> Result<()>;

    /// Closes the transport; never fails.
    async fn close(&self);

    /// Session ID, once started.
    fn session_id(&self) -> Option<SessionId>;

    /// Records the protocol version negotiated by the engine.
    fn set_protocol_version(&self, version: &str);
}

#[async_trait]
impl Transport for WebSocketServerTransport {
    async fn start(&self) -> Result<()> {
        WebSocketServerTransport::start(self).await
    }

    async fn send(&self, message: &JsonRpcMessage) -> Result<()> {
        WebSocketServerTransport::send(self, message).await
    }

    async fn close(&self) {
        WebSocketServerTransport::close(self).await;
    }

    fn session_id(&self) -> Option<SessionId> {
        WebSocketServerTransport::session_id(self)
    }

    fn set_protocol_version(&self, version: &str) {
        WebSocketServerTransport::set_protocol_version(self, version);
    }
}

// ============================================================================
// Tests
// ============================================================================
