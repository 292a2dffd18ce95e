//! Ping server demo.
//!
//! Accepts WebSocket connections and answers every JSON-RPC request with
//! an empty result. Notifications are logged and dropped.
//!
//! Usage:
//!   cargo run --example ping_server -- [--debug] [--port N]
//!
//! Then, with any WebSocket client:
//!   {"jsonrpc":"2.0","id":1,"method":"ping"}

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use mcp_ws_transport::{
    BoxError, ConnectionHandler, JsonRpcMessage, ServerOptions, WebSocketServer,
    WebSocketServerTransport,
};
use serde_json::Map;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    port: u16,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let port = args
            .iter()
            .position(|a| a == "--port")
            .and_then(|i| args.get(i + 1))
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            port,
        }
    }
}

/// Replies to every request with `{}`.
struct PingEngine;

#[async_trait]
impl ConnectionHandler for PingEngine {
    async fn on_open(&self, transport: Arc<WebSocketServerTransport>) -> Result<(), BoxError> {
        let weak = Arc::downgrade(&transport);

        transport.set_message_handler(move |message, extra| {
            let Some(transport) = weak.upgrade() else {
                return;
            };
            let peer = extra.and_then(|e| e.peer).unwrap_or_default();

            match message {
                JsonRpcMessage::Request(request) => {
                    info!(%peer, method = %request.method, id = %request.id, "Request");
                    tokio::spawn(async move {
                        let reply = JsonRpcMessage::response(request.id, Map::new());
                        if let Err(e) = transport.send(&reply).await {
                            warn!(error = %e, "Reply failed");
                        }
                    });
                }
                other => info!(%peer, message = %other.brief(), "Ignoring message"),
            }
        });

        transport.set_error_handler(|e| warn!(kind = %e.kind(), "Transport error"));
        transport.set_close_handler(|| info!("Transport closed"));

        transport.start().await?;
        info!(session = ?transport.session_id(), "Session started");
        Ok(())
    }
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.debug {
        "mcp_ws_transport=debug,ping_server=debug"
    } else {
        "mcp_ws_transport=info,ping_server=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let server = WebSocketServer::bind(ServerOptions::new().with_port(args.port)).await?;
    println!("Listening on {}", server.ws_url());
    println!("Press Ctrl+C to stop");

    server
        .serve_with_shutdown(Arc::new(PingEngine), async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    Ok(())
}
