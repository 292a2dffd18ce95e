//! [`Socket`] implementation over a tokio-tungstenite stream.
//!
//! # Writer Task
//!
//! Writes are queued on an unbounded channel and drained by a spawned
//! task that owns the sink half of the stream. This keeps
//! [`Socket::send`] synchronous for the transport while the actual I/O
//! stays asynchronous. The ready state is shared with that task so a
//! failed write is visible to the next readiness check.

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use futures_util::{Sink, SinkExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Error as WsError;
use tracing::{debug, trace, warn};

use crate::transport::{BoxError, ReadyState, Socket};

// ============================================================================
// Constants
// ============================================================================

/// Close code sent for a normal shutdown.
pub const CLOSE_NORMAL: u16 = 1000;

/// Close code sent when the server cannot serve the connection.
pub const CLOSE_INTERNAL_ERROR: u16 = 1011;

// ============================================================================
// Outgoing
// ============================================================================

/// Internal commands for the writer task.
enum Outgoing {
    /// Write a text frame.
    Text(String),
    /// Send a close frame and stop.
    Close { code: u16, reason: String },
}

// ============================================================================
// WsSocket
// ============================================================================

/// Server side of one WebSocket connection.
///
/// Owned by the connection's read loop; transports only hold it weakly.
pub struct WsSocket {
    /// Remote address.
    peer: SocketAddr,
    /// Ready state (shared with the writer task).
    ready_state: Arc<AtomicU8>,
    /// Channel to the writer task.
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl WsSocket {
    /// Creates an open socket and spawns its writer task on `sink`.
    pub fn spawn<S>(peer: SocketAddr, sink: S) -> Arc<Self>
    where
        S: Sink<Message, Error = WsError> + Unpin + Send + 'static,
    {
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let ready_state = Arc::new(AtomicU8::new(ReadyState::Open.as_u8()));

        tokio::spawn(Self::run_writer(
            peer,
            sink,
            outgoing_rx,
            Arc::clone(&ready_state),
        ));

        Arc::new(Self {
            peer,
            ready_state,
            outgoing,
        })
    }

    /// Returns the remote address.
    #[inline]
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Starts a close with an explicit code and reason.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket is not open.
    pub fn close_with(&self, code: u16, reason: impl Into<String>) -> Result<(), BoxError> {
        let state = self.ready_state();
        if !state.is_open() {
            return Err(format!("cannot close socket in state {state}").into());
        }

        self.set_ready_state(ReadyState::Closing);
        self.outgoing
            .send(Outgoing::Close {
                code,
                reason: reason.into(),
            })
            .map_err(|_| BoxError::from("writer task has stopped"))
    }

    /// Marks the socket closed once the read side has ended.
    pub fn mark_closed(&self) {
        self.set_ready_state(ReadyState::Closed);
    }

    fn set_ready_state(&self, state: ReadyState) {
        self.ready_state.store(state.as_u8(), Ordering::Release);
    }

    /// Writer loop: drains queued frames into the sink.
    async fn run_writer<S>(
        peer: SocketAddr,
        mut sink: S,
        mut outgoing_rx: mpsc::UnboundedReceiver<Outgoing>,
        ready_state: Arc<AtomicU8>,
    ) where
        S: Sink<Message, Error = WsError> + Unpin + Send + 'static,
    {
        while let Some(command) = outgoing_rx.recv().await {
            match command {
                Outgoing::Text(text) => {
                    if let Err(e) = sink.send(Message::Text(text.into())).await {
                        warn!(%peer, error = %e, "Failed to write frame");
                        ready_state.store(ReadyState::Closed.as_u8(), Ordering::Release);
                        break;
                    }
                    trace!(%peer, "Frame written");
                }

                Outgoing::Close { code, reason } => {
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        debug!(%peer, error = %e, "Failed to send close frame");
                    }
                    let _ = sink.close().await;
                    break;
                }
            }
        }

        debug!(%peer, "Writer task terminated");
    }
}

impl Socket for WsSocket {
    fn peer(&self) -> String {
        self.peer.to_string()
    }

    fn ready_state(&self) -> ReadyState {
        ReadyState::from_u8(self.ready_state.load(Ordering::Acquire))
    }

    fn send(&self, payload: &str) -> Result<(), BoxError> {
        self.outgoing
            .send(Outgoing::Text(payload.to_owned()))
            .map_err(|_| BoxError::from("writer task has stopped"))
    }

    fn close(&self) -> Result<(), BoxError> {
        self.close_with(CLOSE_NORMAL, "")
    }
}

// ============================================================================
// Tests
// ============================================================================
