//! WebSocket server host.
//!
//! A ready-made host for [`WebSocketServerTransport`]: it accepts
//! connections, creates one transport per connection, mounts it and
//! forwards socket events to it. Applications plug in through
//! [`ConnectionHandler`].
//!
//! # Connection Flow
//!
//! 1. Server binds to `options.addr()` (port 0 picks a random port)
//! 2. Client completes the upgrade handshake; path and headers are captured
//! 3. A fresh transport is mounted on the connection's [`WsSocket`]
//! 4. [`ConnectionHandler::on_open`] wires the transport to an engine
//! 5. Frames are fed to the transport until the stream ends
//! 6. Transport is closed and [`ConnectionHandler::on_close`] runs
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use mcp_ws_transport::{ServerOptions, WebSocketServer};
//!
//! let server = WebSocketServer::bind(ServerOptions::new()).await?;
//! println!("listening on {}", server.ws_url());
//! server.serve(Arc::new(MyHandler)).await;
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Server configuration.
pub mod options;

/// Tungstenite-backed socket.
pub mod socket;

// ============================================================================
// Re-exports
// ============================================================================

pub use options::{DEFAULT_BIND_IP, ServerOptions};
pub use socket::{CLOSE_INTERNAL_ERROR, CLOSE_NORMAL, WsSocket};

// ============================================================================
// Imports
// ============================================================================

use std::future;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::StreamExt;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::accept_hdr_async_with_config;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::protocol::MessageExtraInfo;
use crate::transport::{BoxError, Socket, WebSocketServerTransport};

// ============================================================================
// ConnectionHandler
// ============================================================================

/// Application hooks for each accepted connection.
#[async_trait]
pub trait ConnectionHandler: Send + Sync + 'static {
    /// Called once the transport is mounted.
    ///
    /// Register handlers and call `start` here.
    ///
    /// # Errors
    ///
    /// A returned error is reported to the transport's error handler and
    /// the connection is closed with code 1011.
    async fn on_open(
        &self,
        transport: Arc<WebSocketServerTransport>,
    ) -> std::result::Result<(), BoxError>;

    /// Called after the connection ended and the transport closed.
    async fn on_close(&self, transport: Arc<WebSocketServerTransport>) {
        let _ = transport;
    }
}

// ============================================================================
// WebSocketServer
// ============================================================================

/// A bound WebSocket listener.
pub struct WebSocketServer {
    /// TCP listener.
    listener: TcpListener,
    /// Bound address.
    local_addr: SocketAddr,
    /// Server configuration.
    options: ServerOptions,
}

impl WebSocketServer {
    /// Binds a listener.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(options: ServerOptions) -> Result<Self> {
        let listener = TcpListener::bind(options.addr()).await?;
        let local_addr = listener.local_addr()?;

        debug!(%local_addr, "WebSocket server bound");

        Ok(Self {
            listener,
            local_addr,
            options,
        })
    }

    /// Returns the bound port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the bound address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the WebSocket URL for this server.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.local_addr)
    }

    /// Returns the server configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &ServerOptions {
        &self.options
    }

    /// Accepts connections until the task is dropped.
    pub async fn serve<H: ConnectionHandler>(self, handler: Arc<H>) {
        self.serve_with_shutdown(handler, future::pending()).await;
    }

    /// Accepts connections until `shutdown` resolves.
    ///
    /// Connections already accepted keep running.
    pub async fn serve_with_shutdown<H, F>(self, handler: Arc<H>, shutdown: F)
    where
        H: ConnectionHandler,
        F: Future<Output = ()> + Send,
    {
        info!(addr = %self.local_addr, "WebSocket server listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!("WebSocket server shutting down");
                    break;
                }

                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        debug!(%addr, "TCP connection accepted");
                        let handler = Arc::clone(&handler);
                        let options = self.options.clone();

                        tokio::spawn(async move {
                            let result = handle_connection(stream, addr, handler, options).await;
                            if let Err(e) = result {
                                warn!(%addr, error = %e, "Connection failed");
                            }
                        });
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                    }
                },
            }
        }
    }
}

// ============================================================================
// Connection Handling
// ============================================================================

/// Runs one connection from handshake to close.
async fn handle_connection<H: ConnectionHandler>(
    stream: TcpStream,
    addr: SocketAddr,
    handler: Arc<H>,
    options: ServerOptions,
) -> Result<()> {
    let mut extra = MessageExtraInfo::new().with_peer(addr.to_string());

    let capture = |request: &Request, response: Response| {
        extra.path = Some(request.uri().path().to_owned());
        for (name, value) in request.headers() {
            if let Ok(value) = value.to_str() {
                extra.headers.insert(name.as_str().to_owned(), value.to_owned());
            }
        }
        Ok::<_, ErrorResponse>(response)
    };

    let config = options
        .max_message_size
        .map(|max| WebSocketConfig::default().max_message_size(Some(max)));

    let ws_stream = accept_hdr_async_with_config(stream, capture, config).await?;
    info!(
        %addr,
        path = extra.path.as_deref().unwrap_or("/"),
        "WebSocket connection established"
    );

    let (sink, mut frames) = ws_stream.split();
    let socket = WsSocket::spawn(addr, sink);
    let handle: Arc<dyn Socket> = socket.clone();

    let transport = Arc::new(WebSocketServerTransport::with_options(options.transport));

    if let Err(e) = transport.mount(&handle) {
        warn!(%addr, error = %e, "Failed to bind transport");
        let _ = socket.close_with(CLOSE_INTERNAL_ERROR, "Failed to bind transport");
        return Ok(());
    }

    if let Err(cause) = handler.on_open(Arc::clone(&transport)).await {
        let error = Error::unknown_with("connection handler failed", cause);
        warn!(%addr, error = %error, "Connection handler failed");
        transport.report_error(&error);
        let _ = socket.close_with(CLOSE_INTERNAL_ERROR, "Connection handler failed");
    }

    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                transport.handle_message(text.as_str(), Some(extra.clone()));
            }

            Ok(Message::Binary(bytes)) => {
                transport.handle_message(&bytes[..], Some(extra.clone()));
            }

            Ok(Message::Close(frame)) => {
                debug!(%addr, ?frame, "Close frame received");
            }

            Ok(_) => {}

            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => break,

            Err(e) => {
                transport.handle_error(e);
                break;
            }
        }
    }

    socket.mark_closed();
    transport.handle_close();
    handler.on_close(Arc::clone(&transport)).await;

    info!(%addr, "WebSocket connection closed");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use futures_util::SinkExt;
    use serde_json::{Map, Value};
    use tokio::sync::{mpsc, oneshot};
    use tokio::time::timeout;
    use tokio_tungstenite::connect_async;

    use crate::error::ErrorKind;
    use crate::protocol::JsonRpcMessage;

    const WAIT: Duration = Duration::from_secs(5);

    #[derive(Debug, PartialEq)]
    enum Event {
        Error(ErrorKind),
        TransportClosed,
        HandlerClosed,
    }

    /// Answers every request with an empty result.
    struct PingHandler {
        events: mpsc::UnboundedSender<Event>,
        fail_open: bool,
    }

    #[async_trait]
    impl ConnectionHandler for PingHandler {
        async fn on_open(
            &self,
            transport: Arc<WebSocketServerTransport>,
        ) -> std::result::Result<(), BoxError> {
            let events = self.events.clone();
            transport.set_error_handler(move |e| {
                let _ = events.send(Event::Error(e.kind()));
            });

            let events = self.events.clone();
            transport.set_close_handler(move || {
                let _ = events.send(Event::TransportClosed);
            });

            if self.fail_open {
                return Err("engine refused connection".into());
            }

            let weak = Arc::downgrade(&transport);
            transport.set_message_handler(move |message, _| {
                let Some(transport) = weak.upgrade() else {
                    return;
                };
                if let JsonRpcMessage::Request(request) = message {
                    tokio::spawn(async move {
                        let reply = JsonRpcMessage::response(request.id, Map::new());
                        let _ = transport.send(&reply).await;
                    });
                }
            });

            transport.start().await?;
            Ok(())
        }

        async fn on_close(&self, _transport: Arc<WebSocketServerTransport>) {
            let _ = self.events.send(Event::HandlerClosed);
        }
    }

    async fn start_server(
        fail_open: bool,
    ) -> (String, mpsc::UnboundedReceiver<Event>, oneshot::Sender<()>) {
        let server = WebSocketServer::bind(ServerOptions::new())
            .await
            .expect("bind");
        let url = server.ws_url();

        let (events, rx) = mpsc::unbounded_channel();
        let handler = Arc::new(PingHandler { events, fail_open });
        let (stop, stopped) = oneshot::channel::<()>();

        tokio::spawn(server.serve_with_shutdown(handler, async move {
            let _ = stopped.await;
        }));

        (url, rx, stop)
    }

    async fn next_event(events: &mut mpsc::UnboundedReceiver<Event>) -> Event {
        timeout(WAIT, events.recv())
            .await
            .expect("event in time")
            .expect("event channel open")
    }

    #[tokio::test]
    async fn test_bind_random_port() {
        let server = WebSocketServer::bind(ServerOptions::new())
            .await
            .expect("bind");
        assert_ne!(server.port(), 0);
        assert_eq!(server.ws_url(), format!("ws://127.0.0.1:{}", server.port()));
    }

    #[tokio::test]
    async fn test_request_gets_response() {
        let (url, _events, _stop) = start_server(false).await;
        let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");

        ws.send(Message::text(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#.to_owned(),
        ))
        .await
        .expect("send");

        let reply = timeout(WAIT, ws.next())
            .await
            .expect("reply in time")
            .expect("stream open")
            .expect("frame");
        let Message::Text(text) = reply else {
            panic!("expected text frame, got {reply:?}");
        };
        let value: Value = serde_json::from_str(text.as_str()).expect("json");
        assert_eq!(value, serde_json::json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
    }

    #[tokio::test]
    async fn test_malformed_frame_reported_and_connection_survives() {
        let (url, mut events, _stop) = start_server(false).await;
        let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");

        ws.send(Message::text("{oops".to_owned())).await.expect("send");
        assert_eq!(next_event(&mut events).await, Event::Error(ErrorKind::MalformedJson));

        ws.send(Message::text(r#"{"jsonrpc":"2.0","id":"a"}"#.to_owned()))
            .await
            .expect("send");
        assert_eq!(next_event(&mut events).await, Event::Error(ErrorKind::SpecViolation));

        ws.send(Message::text(
            r#"{"jsonrpc":"2.0","id":"b","method":"ping"}"#.to_owned(),
        ))
        .await
        .expect("send");
        let reply = timeout(WAIT, ws.next()).await.expect("reply in time");
        assert!(matches!(reply, Some(Ok(Message::Text(_)))));
    }

    #[tokio::test]
    async fn test_client_close_fires_handlers_once() {
        let (url, mut events, _stop) = start_server(false).await;
        let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");

        ws.close(None).await.expect("close");

        assert_eq!(next_event(&mut events).await, Event::TransportClosed);
        assert_eq!(next_event(&mut events).await, Event::HandlerClosed);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_open_closes_with_internal_error() {
        let (url, mut events, _stop) = start_server(true).await;
        let (mut ws, _) = connect_async(url.as_str()).await.expect("connect");

        assert_eq!(next_event(&mut events).await, Event::Error(ErrorKind::Unknown));

        let frame = timeout(WAIT, ws.next())
            .await
            .expect("close in time")
            .expect("stream open")
            .expect("frame");
        match frame {
            Message::Close(Some(close)) => {
                assert_eq!(u16::from(close.code), CLOSE_INTERNAL_ERROR);
            }
            other => panic!("expected close frame, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_shutdown_stops_accepting() {
        let server = WebSocketServer::bind(ServerOptions::new())
            .await
            .expect("bind");
        let (events, _rx) = mpsc::unbounded_channel();
        let handler = Arc::new(PingHandler {
            events,
            fail_open: false,
        });

        let serving = tokio::spawn(server.serve_with_shutdown(handler, async {}));
        timeout(WAIT, serving)
            .await
            .expect("stopped in time")
            .expect("task ok");
    }
}
