//! MCP WebSocket Transport - JSON-RPC over server-side WebSockets.
//!
//! This library adapts an accepted WebSocket connection to the
//! message-oriented transport contract that a Model Context Protocol
//! (or any JSON-RPC 2.0) engine expects.
//!
//! # Architecture
//!
//! The transport sits between two parties it does not own:
//!
//! - **Host (socket layer)**: Accepts connections, owns each socket, and
//!   forwards frames, close and error events to the transport
//! - **Engine (RPC layer)**: Registers handlers, calls `start`, `send`
//!   and `close`, and never touches the socket
//!
//! Key design principles:
//!
//! - Each [`WebSocketServerTransport`] binds at most one connection, held weakly
//! - Inbound frames are decoded and shape-checked before the engine sees them
//! - Failures surface as typed [`Error`]s, mirrored to the error handler
//! - The close handler fires exactly once per transport
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use mcp_ws_transport::{
//!     BoxError, ConnectionHandler, ServerOptions, WebSocketServer, WebSocketServerTransport,
//! };
//!
//! struct Engine;
//!
//! #[async_trait]
//! impl ConnectionHandler for Engine {
//!     async fn on_open(
//!         &self,
//!         transport: Arc<WebSocketServerTransport>,
//!     ) -> Result<(), BoxError> {
//!         transport.set_message_handler(|message, _extra| {
//!             println!("received {}", message.brief());
//!         });
//!         transport.start().await?;
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> mcp_ws_transport::Result<()> {
//!     let server = WebSocketServer::bind(ServerOptions::new().with_port(3000)).await?;
//!     println!("Listening on {}", server.ws_url());
//!     server.serve(Arc::new(Engine)).await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`codec`] | Frame decoding, shape validation and encoding |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | JSON-RPC message types |
//! | [`server`] | Ready-made tokio-tungstenite host |
//! | [`transport`] | The transport adapter and its socket contract |

// ============================================================================
// Modules
// ============================================================================

/// JSON codec for inbound and outbound frames.
pub mod codec;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// JSON-RPC 2.0 message types.
pub mod protocol;

/// WebSocket server host.
///
/// Accepts connections and drives one transport per connection.
pub mod server;

/// Transport adapter.
///
/// Binds a host-owned socket and exposes the engine-facing contract.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Codec types
pub use codec::{JsonCodec, Payload};

// Error types
pub use error::{Error, ErrorKind, Result};

// Identifier types
pub use identifiers::SessionId;

// Protocol types
pub use protocol::{
    ErrorObject, JsonRpcErrorResponse, JsonRpcMessage, JsonRpcNotification, JsonRpcRequest,
    JsonRpcResponse, MessageExtraInfo, RequestId,
};

// Server types
pub use server::{ConnectionHandler, ServerOptions, WebSocketServer, WsSocket};

// Transport types
pub use transport::{
    BoxError, ReadyState, Socket, Transport, TransportOptions, TransportState,
    WebSocketServerTransport,
};
