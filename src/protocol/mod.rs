//! Protocol message types.
//!
//! This module defines the JSON-RPC 2.0 messages exchanged between the
//! transport and the RPC engine that consumes it.
//!
//! # Protocol Overview
//!
//! | Message Type | Has `id` | Has `method` | Purpose |
//! |--------------|----------|--------------|---------|
//! | Request | yes | yes | Call expecting a response |
//! | Notification | no | yes | One-way message |
//! | Response | yes | no | Successful result |
//! | Error | yes | no | Failed result |
//!
//! The transport validates shape only; method semantics belong to the engine.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `message` | Message shapes and [`JsonRpcMessage`] |
//! | `extra` | [`MessageExtraInfo`] delivered with each message |

// ============================================================================
// Submodules
// ============================================================================

/// Per-message connection context.
pub mod extra;

/// JSON-RPC 2.0 message shapes.
pub mod message;

// ============================================================================
// Re-exports
// ============================================================================

pub use extra::MessageExtraInfo;
pub use message::{
    ErrorObject, JSONRPC_VERSION, JsonRpcErrorResponse, JsonRpcMessage, JsonRpcNotification,
    JsonRpcRequest, JsonRpcResponse, JsonRpcVersion, RequestId,
};
