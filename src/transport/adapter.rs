//! The WebSocket server transport.
//!
//! [`WebSocketServerTransport`] adapts one host socket to the
//! start/send/close contract an RPC engine expects, and exposes the
//! `handle_*` entry points the host socket layer drives.
//!
//! # Lifecycle
//!
//! ```text
//! Unbound ──mount──► Idle ──start──► Active
//!    │                 │                │
//!    └──────close / handle_close────────┴──► Closed
//! ```
//!
//! # Error Reporting
//!
//! Failures of `mount`, `start` and `send` are returned to the caller and
//! also passed to the error handler. Decode failures of inbound frames
//! have no caller, so they only reach the error handler and the frame is
//! dropped. Closing a socket that is already dead, or was never mounted,
//! is not reported.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::codec::{JsonCodec, Payload};
use crate::error::{Error, Result};
use crate::identifiers::SessionId;
use crate::protocol::{JsonRpcMessage, MessageExtraInfo};

use super::binder::Binder;
use super::options::TransportOptions;
use super::socket::{BoxError, Socket};

// ============================================================================
// Types
// ============================================================================

/// Called once per successfully decoded inbound message.
pub type MessageHandler = Arc<dyn Fn(JsonRpcMessage, Option<MessageExtraInfo>) + Send + Sync>;

/// Called exactly once when the transport closes.
pub type CloseHandler = Arc<dyn Fn() + Send + Sync>;

/// Called for every reported failure.
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

// ============================================================================
// TransportState
// ============================================================================

/// Observable lifecycle state of a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportState {
    /// No socket mounted yet.
    Unbound,
    /// Socket mounted, `start` not called.
    Idle,
    /// Started and bound.
    Active,
    /// Terminal.
    Closed,
}

// ============================================================================
// Internal State
// ============================================================================

#[derive(Default)]
struct Inner {
    binder: Binder,
    started: bool,
    closed: bool,
    session_id: Option<SessionId>,
    protocol_version: Option<String>,
}

impl Inner {
    fn state(&self) -> TransportState {
        if self.closed {
            TransportState::Closed
        } else if !self.binder.is_bound() {
            TransportState::Unbound
        } else if self.started {
            TransportState::Active
        } else {
            TransportState::Idle
        }
    }
}

#[derive(Default)]
struct Handlers {
    message: Option<MessageHandler>,
    close: Option<CloseHandler>,
    error: Option<ErrorHandler>,
}

// ============================================================================
// WebSocketServerTransport
// ============================================================================

/// Transport bound to a single server-side WebSocket connection.
///
/// Create one per connection, mount the connection's socket, register
/// handlers, then `start`. The instance is not reusable after close.
///
/// # Thread Safety
///
/// All methods take `&self`; share the transport in an `Arc` between the
/// host read loop and whatever produces outbound messages. Handlers are
/// invoked without any internal lock held, so they may call back into
/// the transport.
///
/// # Example
///
/// ```ignore
/// let transport = Arc::new(WebSocketServerTransport::new());
/// transport.mount(&socket)?;
/// transport.set_message_handler(|msg, _extra| println!("{}", msg.brief()));
/// transport.start().await?;
/// transport.send(&JsonRpcMessage::notification("ready", None)).await?;
/// ```
pub struct WebSocketServerTransport {
    options: TransportOptions,
    inner: Mutex<Inner>,
    handlers: Mutex<Handlers>,
}

impl Default for WebSocketServerTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WebSocketServerTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("WebSocketServerTransport")
            .field("state", &inner.state())
            .field("peer", &inner.binder.peer())
            .field("session_id", &inner.session_id)
            .field("protocol_version", &inner.protocol_version)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// WebSocketServerTransport - Constructors
// ============================================================================

impl WebSocketServerTransport {
    /// Creates an unbound transport with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(TransportOptions::default())
    }

    /// Creates an unbound transport with the given options.
    #[must_use]
    pub fn with_options(options: TransportOptions) -> Self {
        Self {
            options,
            inner: Mutex::new(Inner::default()),
            handlers: Mutex::new(Handlers::default()),
        }
    }
}

// ============================================================================
// WebSocketServerTransport - Lifecycle
// ============================================================================

impl WebSocketServerTransport {
    /// Binds the transport to `socket`.
    ///
    /// Mounting the already-bound socket again succeeds without effect.
    ///
    /// # Errors
    ///
    /// - [`Error::IllegalRebind`] if a different socket is bound
    /// - [`Error::Closed`] if the transport has been closed
    pub fn mount(&self, socket: &Arc<dyn Socket>) -> Result<()> {
        let result = {
            let mut inner = self.inner.lock();
            if inner.closed {
                Err(Error::Closed)
            } else {
                inner.binder.mount(socket)
            }
        };

        match &result {
            Ok(()) => debug!(peer = %socket.peer(), "Transport mounted"),
            Err(e) => self.report_error(e),
        }

        result
    }

    /// Activates the transport.
    ///
    /// Assigns the session ID on the first successful call; later calls
    /// are no-ops.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectMissing`] if no socket is mounted
    /// - [`Error::SocketDead`] if the mounted socket is not open
    pub async fn start(&self) -> Result<()> {
        let result = {
            let mut inner = self.inner.lock();
            match inner.binder.ensure() {
                Ok(_) => {
                    inner.started = true;
                    Ok(*inner.session_id.get_or_insert_with(SessionId::generate))
                }
                Err(e) => Err(e),
            }
        };

        match result {
            Ok(session_id) => {
                debug!(%session_id, "Transport started");
                Ok(())
            }
            Err(e) => {
                self.report_error(&e);
                Err(e)
            }
        }
    }

    /// Encodes and writes one message.
    ///
    /// Each call encodes and writes independently; ordering between
    /// concurrent sends is whatever the socket gives.
    ///
    /// # Errors
    ///
    /// - [`Error::EncodeFailed`] if the message cannot be serialized
    /// - [`Error::ConnectMissing`] if no socket is mounted
    /// - [`Error::SocketDead`] if the socket is not open
    /// - [`Error::TransmitFailed`] if the socket rejects the write
    pub async fn send(&self, message: &JsonRpcMessage) -> Result<()> {
        let result = self.transmit(message);
        if let Err(e) = &result {
            self.report_error(e);
        }
        result
    }

    /// Closes the transport.
    ///
    /// Safe to call in any state and any number of times.
    pub async fn close(&self) {
        self.shutdown();
    }

    fn transmit(&self, message: &JsonRpcMessage) -> Result<()> {
        let payload = JsonCodec::encode(message, self.options.pretty)?;
        let socket = self.inner.lock().binder.ensure()?;

        socket.send(&payload).map_err(|source| {
            Error::transmit_failed(&payload, self.options.max_display_chars, source)
        })?;

        trace!(message = %message.brief(), bytes = payload.len(), "Message sent");
        Ok(())
    }

    fn shutdown(&self) {
        let (ensured, first) = {
            let mut inner = self.inner.lock();
            let ensured = inner.binder.ensure();
            inner.binder.unbind();
            let first = !inner.closed;
            inner.closed = true;
            (ensured, first)
        };

        let closed = ensured.and_then(|socket| {
            socket
                .close()
                .map_err(|cause| Error::unknown_with("websocket close failed", cause))
        });

        match closed {
            Ok(()) => debug!("Socket close initiated"),
            Err(e) if e.is_benign_on_close() => trace!(kind = %e.kind(), "Socket already gone"),
            Err(e) => self.report_error(&e),
        }

        if first {
            debug!("Transport closed");
            let handler = self.handlers.lock().close.clone();
            if let Some(handler) = handler {
                handler();
            }
        }
    }
}

// ============================================================================
// WebSocketServerTransport - Host Entry Points
// ============================================================================

impl WebSocketServerTransport {
    /// Feeds one inbound frame.
    ///
    /// Call from the host's message callback. Frames arriving after close
    /// are dropped.
    pub fn handle_message<'a>(
        &self,
        payload: impl Into<Payload<'a>>,
        extra: Option<MessageExtraInfo>,
    ) {
        if self.inner.lock().closed {
            trace!("Dropping message received after close");
            return;
        }

        match JsonCodec::decode(payload) {
            Ok(message) => {
                trace!(message = %message.brief(), "Message received");
                let handler = self.handlers.lock().message.clone();
                if let Some(handler) = handler {
                    handler(message, extra);
                }
            }
            Err(e) => {
                debug!(kind = %e.kind(), "Dropping undecodable message");
                self.report_error(&e);
            }
        }
    }

    /// Call from the host's close callback.
    pub fn handle_close(&self) {
        self.shutdown();
    }

    /// Call from the host's error callback.
    ///
    /// Reported as [`Error::Unknown`]; does not change state.
    pub fn handle_error(&self, cause: impl Into<BoxError>) {
        let error = Error::unknown_with("websocket error", cause);
        warn!(error = %error, "Socket error");
        self.report_error(&error);
    }

    /// Passes `error` to the error handler, if one is registered.
    pub fn report_error(&self, error: &Error) {
        let handler = self.handlers.lock().error.clone();
        match handler {
            Some(handler) => handler(error),
            None => trace!(kind = %error.kind(), "No error handler registered"),
        }
    }
}

// ============================================================================
// WebSocketServerTransport - Handlers
// ============================================================================

impl WebSocketServerTransport {
    /// Sets the inbound message handler.
    pub fn set_message_handler<F>(&self, handler: F)
    where
        F: Fn(JsonRpcMessage, Option<MessageExtraInfo>) + Send + Sync + 'static,
    {
        self.handlers.lock().message = Some(Arc::new(handler));
    }

    /// Sets the close handler.
    pub fn set_close_handler<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.handlers.lock().close = Some(Arc::new(handler));
    }

    /// Sets the error handler.
    pub fn set_error_handler<F>(&self, handler: F)
    where
        F: Fn(&Error) + Send + Sync + 'static,
    {
        self.handlers.lock().error = Some(Arc::new(handler));
    }

    /// Clears the inbound message handler.
    pub fn clear_message_handler(&self) {
        self.handlers.lock().message = None;
    }

    /// Clears the close handler.
    pub fn clear_close_handler(&self) {
        self.handlers.lock().close = None;
    }

    /// Clears the error handler.
    pub fn clear_error_handler(&self) {
        self.handlers.lock().error = None;
    }
}

// ============================================================================
// WebSocketServerTransport - Accessors
// ============================================================================

impl WebSocketServerTransport {
    /// Returns the session ID, assigned by the first successful `start`.
    #[inline]
    #[must_use]
    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.lock().session_id
    }

    /// Returns the negotiated protocol version.
    #[inline]
    #[must_use]
    pub fn protocol_version(&self) -> Option<String> {
        self.inner.lock().protocol_version.clone()
    }

    /// Records the negotiated protocol version.
    pub fn set_protocol_version(&self, version: impl Into<String>) {
        self.inner.lock().protocol_version = Some(version.into());
    }

    /// Returns the lifecycle state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> TransportState {
        self.inner.lock().state()
    }

    /// Returns the peer of the mounted socket.
    #[inline]
    #[must_use]
    pub fn peer(&self) -> Option<String> {
        self.inner.lock().binder.peer().map(str::to_owned)
    }

    /// Returns the options this transport was built with.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &TransportOptions {
        &self.options
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    use crate::error::ErrorKind;
    use crate::protocol::RequestId;
    use crate::transport::ReadyState;
    use crate::transport::mock::MockSocket;

    /// Records everything the transport reports.
    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<(JsonRpcMessage, Option<MessageExtraInfo>)>>,
        errors: Mutex<Vec<ErrorKind>>,
        closes: AtomicUsize,
    }

    impl Recorder {
        fn attach(transport: &WebSocketServerTransport) -> Arc<Self> {
            let recorder = Arc::new(Self::default());

            let r = Arc::clone(&recorder);
            transport.set_message_handler(move |msg, extra| r.messages.lock().push((msg, extra)));
            let r = Arc::clone(&recorder);
            transport.set_error_handler(move |e| r.errors.lock().push(e.kind()));
            let r = Arc::clone(&recorder);
            transport.set_close_handler(move || {
                r.closes.fetch_add(1, Ordering::SeqCst);
            });

            recorder
        }

        fn errors(&self) -> Vec<ErrorKind> {
            self.errors.lock().clone()
        }

        fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }

        fn message_count(&self) -> usize {
            self.messages.lock().len()
        }
    }

    fn ping() -> JsonRpcMessage {
        JsonRpcMessage::request(1_i64, "ping", None)
    }

    #[tokio::test]
    async fn test_never_mounted() {
        let transport = WebSocketServerTransport::new();
        let recorder = Recorder::attach(&transport);
        assert_eq!(transport.state(), TransportState::Unbound);

        let err = assert_err!(transport.start().await);
        assert_eq!(err.kind(), ErrorKind::ConnectMissing);

        let err = assert_err!(transport.send(&ping()).await);
        assert_eq!(err.kind(), ErrorKind::ConnectMissing);

        transport.close().await;

        assert_eq!(
            recorder.errors(),
            vec![ErrorKind::ConnectMissing, ErrorKind::ConnectMissing]
        );
        assert_eq!(recorder.closes(), 1);
        assert_eq!(transport.session_id(), None);
    }

    #[tokio::test]
    async fn test_mount_twice_is_idempotent() {
        let socket = MockSocket::new("a");
        let transport = WebSocketServerTransport::new();

        assert_ok!(transport.mount(&socket.handle()));
        assert_ok!(transport.mount(&socket.handle()));

        assert_eq!(transport.state(), TransportState::Idle);
        assert_eq!(transport.peer().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn test_rebind_rejected() {
        let first = MockSocket::new("peer-a");
        let second = MockSocket::new("peer-b");
        let transport = WebSocketServerTransport::new();
        let recorder = Recorder::attach(&transport);

        assert_ok!(transport.mount(&first.handle()));
        let err = assert_err!(transport.mount(&second.handle()));
        assert_eq!(err.kind(), ErrorKind::IllegalRebind);
        assert_eq!(recorder.errors(), vec![ErrorKind::IllegalRebind]);

        assert_ok!(transport.send(&ping()).await);
        assert_eq!(first.sent().len(), 1);
        assert!(second.sent().is_empty());
    }

    #[tokio::test]
    async fn test_start_assigns_stable_session_id() {
        let socket = MockSocket::new("a");
        let transport = WebSocketServerTransport::new();
        assert_ok!(transport.mount(&socket.handle()));

        assert_ok!(transport.start().await);
        let id = transport.session_id().expect("session id assigned");
        assert_eq!(transport.state(), TransportState::Active);

        assert_ok!(transport.start().await);
        assert_eq!(transport.session_id(), Some(id));
        assert_eq!(transport.session_id(), Some(id));
    }

    #[tokio::test]
    async fn test_start_on_connecting_socket() {
        let socket = MockSocket::new("a");
        socket.set_state(ReadyState::Connecting);
        let transport = WebSocketServerTransport::new();
        assert_ok!(transport.mount(&socket.handle()));

        let err = assert_err!(transport.start().await);
        assert_eq!(err.kind(), ErrorKind::SocketDead);
        assert_eq!(transport.session_id(), None);
        assert_eq!(transport.state(), TransportState::Idle);
    }

    #[tokio::test]
    async fn test_ping_then_remote_close() {
        let socket = MockSocket::new("a");
        let transport = WebSocketServerTransport::new();
        let recorder = Recorder::attach(&transport);
        assert_ok!(transport.mount(&socket.handle()));
        assert_ok!(transport.start().await);

        let msg = JsonCodec::decode(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).unwrap();
        assert_ok!(transport.send(&msg).await);

        let sent = socket.sent();
        assert_eq!(sent.len(), 1);
        let written: serde_json::Value = serde_json::from_str(&sent[0]).unwrap();
        assert_eq!(written, json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}));

        socket.set_state(ReadyState::Closed);
        let err = assert_err!(transport.send(&msg).await);
        assert_eq!(err.kind(), ErrorKind::SocketDead);
        assert_eq!(recorder.errors(), vec![ErrorKind::SocketDead]);
        assert_eq!(socket.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_pretty_encoding_option() {
        let socket = MockSocket::new("a");
        let transport = WebSocketServerTransport::with_options(TransportOptions::new().with_pretty());
        assert_ok!(transport.mount(&socket.handle()));

        assert_ok!(transport.send(&ping()).await);
        assert!(socket.sent()[0].contains("\n  \"method\": \"ping\""));
    }

    #[tokio::test]
    async fn test_transmit_failure_is_returned_and_reported() {
        let socket = MockSocket::new("a");
        socket.fail_send();
        let transport =
            WebSocketServerTransport::with_options(TransportOptions::new().with_max_display_chars(8));
        let recorder = Recorder::attach(&transport);
        assert_ok!(transport.mount(&socket.handle()));

        match transport.send(&ping()).await {
            Err(Error::TransmitFailed { payload, .. }) => {
                assert!(payload.starts_with("{\"jsonrp"));
                assert!(payload.contains("more chars"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(recorder.errors(), vec![ErrorKind::TransmitFailed]);
    }

    #[tokio::test]
    async fn test_inbound_message_delivered_with_extra() {
        let socket = MockSocket::new("a");
        let transport = WebSocketServerTransport::new();
        let recorder = Recorder::attach(&transport);
        assert_ok!(transport.mount(&socket.handle()));
        assert_ok!(transport.start().await);

        let extra = MessageExtraInfo::new().with_peer("a");
        transport.handle_message(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            Some(extra.clone()),
        );
        transport.handle_message(br#"{"jsonrpc":"2.0","id":"b","result":{}}"#.as_slice(), None);

        let messages = recorder.messages.lock();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].0.method(), Some("notifications/initialized"));
        assert_eq!(messages[0].1, Some(extra));
        assert!(matches!(messages[1].0, JsonRpcMessage::Response(_)));
        assert!(recorder.errors().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_inbound_dropped_and_reported() {
        let socket = MockSocket::new("a");
        let transport = WebSocketServerTransport::new();
        let recorder = Recorder::attach(&transport);
        assert_ok!(transport.mount(&socket.handle()));
        assert_ok!(transport.start().await);

        transport.handle_message("{not json", None);
        transport.handle_message("{}", None);
        transport.handle_message(r#"{"foo":1}"#, None);

        assert_eq!(recorder.message_count(), 0);
        assert_eq!(
            recorder.errors(),
            vec![
                ErrorKind::MalformedJson,
                ErrorKind::SpecViolation,
                ErrorKind::SpecViolation
            ]
        );
        assert_eq!(transport.state(), TransportState::Active);
    }

    #[tokio::test]
    async fn test_inbound_order_preserved() {
        let socket = MockSocket::new("a");
        let transport = WebSocketServerTransport::new();
        let recorder = Recorder::attach(&transport);
        assert_ok!(transport.mount(&socket.handle()));

        for i in 0..5 {
            transport.handle_message(
                format!(r#"{{"jsonrpc":"2.0","id":{i},"method":"m"}}"#).as_str(),
                None,
            );
        }

        let ids: Vec<_> = recorder
            .messages
            .lock()
            .iter()
            .map(|(m, _)| m.id().cloned())
            .collect();
        let expected: Vec<_> = (0..5i64).map(|i| Some(RequestId::Number(i))).collect();
        assert_eq!(ids, expected);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let socket = MockSocket::new("a");
        let transport = WebSocketServerTransport::new();
        let recorder = Recorder::attach(&transport);
        assert_ok!(transport.mount(&socket.handle()));
        assert_ok!(transport.start().await);

        for _ in 0..4 {
            transport.close().await;
        }

        assert_eq!(recorder.closes(), 1);
        assert_eq!(socket.close_calls(), 1);
        assert!(recorder.errors().is_empty());
        assert_eq!(transport.state(), TransportState::Closed);
        assert_eq!(transport.peer(), None);
    }

    #[tokio::test]
    async fn test_remote_close_then_local_close() {
        let socket = MockSocket::new("a");
        let transport = WebSocketServerTransport::new();
        let recorder = Recorder::attach(&transport);
        assert_ok!(transport.mount(&socket.handle()));

        socket.set_state(ReadyState::Closed);
        transport.handle_close();
        transport.close().await;

        assert_eq!(recorder.closes(), 1);
        assert_eq!(socket.close_calls(), 0);
        assert!(recorder.errors().is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_close_failure_reported() {
        let socket = MockSocket::new("a");
        socket.fail_close();
        let transport = WebSocketServerTransport::new();
        let recorder = Recorder::attach(&transport);
        assert_ok!(transport.mount(&socket.handle()));

        transport.close().await;

        assert_eq!(recorder.errors(), vec![ErrorKind::Unknown]);
        assert_eq!(recorder.closes(), 1);
        assert_eq!(transport.state(), TransportState::Closed);
    }

    #[tokio::test]
    async fn test_nothing_succeeds_after_close() {
        let socket = MockSocket::new("a");
        let transport = WebSocketServerTransport::new();
        let recorder = Recorder::attach(&transport);
        assert_ok!(transport.mount(&socket.handle()));
        transport.close().await;

        let err = assert_err!(transport.mount(&socket.handle()));
        assert_eq!(err.kind(), ErrorKind::Closed);
        let err = assert_err!(transport.start().await);
        assert_eq!(err.kind(), ErrorKind::ConnectMissing);
        let err = assert_err!(transport.send(&ping()).await);
        assert_eq!(err.kind(), ErrorKind::ConnectMissing);

        transport.handle_message(r#"{"jsonrpc":"2.0","method":"late"}"#, None);
        assert_eq!(recorder.message_count(), 0);
    }

    #[tokio::test]
    async fn test_handle_error_reports_unknown() {
        let socket = MockSocket::new("a");
        let transport = WebSocketServerTransport::new();
        let recorder = Recorder::attach(&transport);
        assert_ok!(transport.mount(&socket.handle()));
        assert_ok!(transport.start().await);

        transport.handle_error("connection reset");

        assert_eq!(recorder.errors(), vec![ErrorKind::Unknown]);
        assert_eq!(transport.state(), TransportState::Active);
        assert_eq!(recorder.closes(), 0);
    }

    #[tokio::test]
    async fn test_behaviour_without_handlers() {
        let socket = MockSocket::new("a");
        let transport = WebSocketServerTransport::new();
        assert_ok!(transport.mount(&socket.handle()));
        assert_ok!(transport.start().await);

        transport.handle_message("garbage", None);
        socket.set_state(ReadyState::Closing);
        let err = assert_err!(transport.send(&ping()).await);
        assert_eq!(err.kind(), ErrorKind::SocketDead);
        transport.close().await;
        assert_eq!(transport.state(), TransportState::Closed);
    }

    #[tokio::test]
    async fn test_handlers_may_reenter_transport() {
        let socket = MockSocket::new("a");
        let transport = Arc::new(WebSocketServerTransport::new());
        assert_ok!(transport.mount(&socket.handle()));

        let weak = Arc::downgrade(&transport);
        let observed = Arc::new(Mutex::new(None));
        let slot = Arc::clone(&observed);
        transport.set_close_handler(move || {
            if let Some(t) = weak.upgrade() {
                *slot.lock() = Some(t.state());
            }
        });

        let weak = Arc::downgrade(&transport);
        transport.set_message_handler(move |_, _| {
            if let Some(t) = weak.upgrade() {
                t.clear_message_handler();
            }
        });

        transport.handle_message(r#"{"jsonrpc":"2.0","method":"x"}"#, None);
        transport.close().await;

        assert_eq!(*observed.lock(), Some(TransportState::Closed));
    }

    #[tokio::test]
    async fn test_two_transports_same_socket_independent() {
        let socket = MockSocket::new("shared");
        let x = WebSocketServerTransport::new();
        let y = WebSocketServerTransport::new();

        assert_ok!(x.mount(&socket.handle()));
        assert_ok!(y.mount(&socket.handle()));

        x.close().await;
        assert_eq!(x.state(), TransportState::Closed);
        assert_eq!(y.state(), TransportState::Idle);

        let err = assert_err!(y.send(&ping()).await);
        assert_eq!(err.kind(), ErrorKind::SocketDead);
        assert_eq!(y.peer().as_deref(), Some("shared"));
    }

    #[tokio::test]
    async fn test_protocol_version() {
        let transport = WebSocketServerTransport::new();
        assert_eq!(transport.protocol_version(), None);
        transport.set_protocol_version("2025-06-18");
        assert_eq!(transport.protocol_version().as_deref(), Some("2025-06-18"));
    }
}
