//! Accepts connections, runs one session per connection, and drains
//! in-flight connections on shutdown.
//!
//! Data flow on ingest: transport -> this module -> Message Handler ->
//! Stream Manager. Frames on one connection are read and dispatched
//! strictly in order, so STARTED/STOPPED ordering around binary
//! frames is well defined; across connections no ordering is implied.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;

use stream_cache_protocol::{HandlerResponse, MessageHandler, Session};

use crate::app_context::AppContext;
use crate::shutdown::Shutdown;

pub struct ServerConfig {
    pub bind_host: String,
    pub port: u16,
    pub endpoint_path: String,
    pub max_message_size: usize,
    pub keep_alive_interval: Duration,
    pub close_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_host: "127.0.0.1".to_string(),
            port: 9000,
            endpoint_path: "/stream".to_string(),
            max_message_size: 100 * 1024 * 1024,
            keep_alive_interval: Duration::from_secs(30),
            close_timeout: Duration::from_secs(5),
        }
    }
}

/// Rejects the WebSocket upgrade unless the request path matches the
/// server's configured endpoint, so a server bound to `/stream` does
/// not also answer on every other path.
fn check_path(endpoint_path: &str, request: &Request, response: Response) -> Result<Response, ErrorResponse> {
    if request.uri().path() == endpoint_path {
        Ok(response)
    } else {
        Err(Response::builder()
            .status(StatusCode::NOT_FOUND)
            .body(None)
            .expect("static 404 response is well-formed"))
    }
}

pub struct ConnectionServer {
    config: ServerConfig,
    context: Arc<AppContext>,
    shutdown: Shutdown,
}

impl ConnectionServer {
    pub fn new(config: ServerConfig, context: Arc<AppContext>, shutdown: Shutdown) -> Self {
        Self {
            config,
            context,
            shutdown,
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.bind_host, self.config.port).parse()?;
        let listener = TcpListener::bind(addr).await?;
        log::info!("listening on {}", listener.local_addr()?);
        self.serve(listener).await
    }

    /// Like `run`, but against an already-bound listener. Lets callers
    /// bind port 0 and read back the assigned port before serving,
    /// which the test suite uses to avoid port collisions.
    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        let mut in_flight = Vec::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    let handler = MessageHandler::new(self.context.stream_manager.clone());
                    let endpoint_path = self.config.endpoint_path.clone();
                    let max_message_size = self.config.max_message_size;
                    let keep_alive_interval = self.config.keep_alive_interval;
                    let shutdown = self.shutdown.clone();
                    let task = tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, peer, handler, &endpoint_path, max_message_size, keep_alive_interval, shutdown).await {
                            log::warn!("connection {peer} ended with error: {err}");
                        }
                    });
                    in_flight.push(task);
                }
                _ = self.shutdown.wait() => {
                    log::info!("shutdown requested, no longer accepting connections");
                    break;
                }
            }
        }

        drain(in_flight, self.config.close_timeout).await;

        Ok(())
    }
}

/// Waits for every in-flight connection task to finish, bounded by
/// `close_timeout`. Tasks still running at expiry are aborted rather
/// than awaited further, matching "stop accepting, signal active
/// connections, wait bounded, then close".
async fn drain(in_flight: Vec<tokio::task::JoinHandle<()>>, close_timeout: Duration) {
    let abort_handles: Vec<_> = in_flight.iter().map(|task| task.abort_handle()).collect();

    if tokio::time::timeout(close_timeout, futures::future::join_all(in_flight))
        .await
        .is_err()
    {
        log::warn!(
            "close_timeout elapsed with {} connection(s) still in flight, aborting",
            abort_handles.len()
        );
        for handle in abort_handles {
            handle.abort();
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    handler: MessageHandler,
    endpoint_path: &str,
    max_message_size: usize,
    keep_alive_interval: Duration,
    shutdown: Shutdown,
) -> anyhow::Result<()> {
    // The transport's own frame/message caps default lower than
    // `max_message_size` can be configured, so the manual length check
    // below is only meaningful once the transport is told the same
    // limit.
    let ws_config = WebSocketConfig {
        max_message_size: Some(max_message_size),
        max_frame_size: Some(max_message_size),
        ..WebSocketConfig::default()
    };
    let ws = tokio_tungstenite::accept_hdr_async_with_config(
        stream,
        |request: &Request, response: Response| check_path(endpoint_path, request, response),
        Some(ws_config),
    )
    .await?;
    log::debug!("accepted connection from {peer} on {endpoint_path}");

    let (mut sink, mut source) = ws.split();
    let mut session = Session::new();
    let mut keep_alive = tokio::time::interval(keep_alive_interval);
    keep_alive.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    keep_alive.tick().await; // first tick fires immediately; consume it

    loop {
        let frame = tokio::select! {
            frame = source.next() => frame,
            _ = keep_alive.tick() => {
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
                continue;
            }
            _ = shutdown.wait() => {
                let _ = sink.close().await;
                break;
            }
        };

        let message = match frame {
            Some(Ok(message)) => message,
            Some(Err(err)) => {
                log::debug!("transport error from {peer}: {err}");
                break;
            }
            None => break,
        };

        if message.len() > max_message_size {
            let err = stream_cache_api_types::ControlMessage::error("message exceeds max_message_size");
            let _ = sink.send(Message::Text(err.to_json()?)).await;
            continue;
        }

        let response = match message {
            Message::Text(text) => Some(handler.handle_text(&mut session, &text)),
            Message::Binary(data) => Some(handler.handle_binary(&session, &data)),
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
        };

        match response {
            Some(HandlerResponse::Control(msg)) => {
                sink.send(Message::Text(msg.to_json()?)).await?;
            }
            Some(HandlerResponse::Binary(bytes)) => {
                sink.send(Message::Binary(bytes)).await?;
            }
            Some(HandlerResponse::None) | None => {}
        }
    }

    // A bound stream on disconnect is left in the registry; cleanup is
    // the registry's job, not this connection's.
    log::debug!("connection from {peer} closed");
    Ok(())
}
