//! Signaling server listener
//!
//! Handles the TCP accept loop, upgrades each socket to a WebSocket, and
//! runs one task per connection that pumps frames both ways: outbound
//! events from the session's hub channel onto the socket, inbound text
//! frames parsed as [`ClientRequest`] and dispatched to the hub. A closed
//! socket tears the session down through the hub's disconnect flow.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tokio_tungstenite::tungstenite::Message;

use crate::error::Result;
use crate::push::PushHub;
use crate::registry::SessionId;
use crate::server::config::ServerConfig;
use crate::server::protocol::ClientRequest;

/// WebSocket signaling server (push transport front-end)
pub struct SignalingServer {
    config: ServerConfig,
    hub: Arc<PushHub>,
    connection_semaphore: Option<Arc<Semaphore>>,
}

impl SignalingServer {
    /// Create a new server with the given configuration
    pub fn new(config: ServerConfig) -> Self {
        let connection_semaphore = if config.max_connections > 0 {
            Some(Arc::new(Semaphore::new(config.max_connections)))
        } else {
            None
        };

        Self {
            config,
            hub: Arc::new(PushHub::new()),
            connection_semaphore,
        }
    }

    /// Get a reference to the matchmaking hub
    pub fn hub(&self) -> &Arc<PushHub> {
        &self.hub
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Signaling server listening");

        self.accept_loop(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Signaling server listening");

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        }
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check connection limit
        let permit = if let Some(ref sem) = self.connection_semaphore {
            match sem.clone().try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(peer = %peer_addr, "Connection rejected: limit reached");
                    return;
                }
            }
        } else {
            None
        };

        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
            }
        }

        let hub = Arc::clone(&self.hub);
        tokio::spawn(async move {
            let _permit = permit;
            if let Err(e) = serve_connection(hub, socket, peer_addr).await {
                tracing::debug!(peer = %peer_addr, error = %e, "Connection error");
            }
        });
    }
}

/// Pump one WebSocket connection until either side closes it
async fn serve_connection(
    hub: Arc<PushHub>,
    socket: TcpStream,
    peer_addr: SocketAddr,
) -> Result<()> {
    let ws = tokio_tungstenite::accept_async(socket).await?;
    let (mut sink, mut stream) = ws.split();

    let (session_id, mut events) = hub.connect().await;
    tracing::debug!(session = %session_id, peer = %peer_addr, "WebSocket session open");

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                let text = serde_json::to_string(&event)?;
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientRequest>(&text) {
                            Ok(request) => {
                                if let Err(e) = dispatch(&hub, session_id, request).await {
                                    tracing::warn!(
                                        session = %session_id,
                                        error = %e,
                                        "Request failed"
                                    );
                                }
                            }
                            Err(e) => {
                                // Malformed frames are never fatal
                                tracing::warn!(session = %session_id, error = %e, "Bad frame");
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = sink.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {} // binary and pong frames ignored
                    Some(Err(e)) => {
                        tracing::debug!(session = %session_id, error = %e, "Socket error");
                        break;
                    }
                }
            }
        }
    }

    hub.disconnect(session_id).await;
    tracing::debug!(session = %session_id, peer = %peer_addr, "WebSocket session closed");
    Ok(())
}

async fn dispatch(hub: &PushHub, session_id: SessionId, request: ClientRequest) -> Result<()> {
    match request {
        ClientRequest::StartChat { profile } => hub.start_chat(session_id, profile).await,
        ClientRequest::Next { profile } => hub.next(session_id, profile).await,
        ClientRequest::Message { text } => hub.chat(session_id, text).await,
        ClientRequest::Offer { payload } => {
            hub.signal(session_id, crate::event::SignalKind::Offer, payload)
                .await
        }
        ClientRequest::Answer { payload } => {
            hub.signal(session_id, crate::event::SignalKind::Answer, payload)
                .await
        }
        ClientRequest::IceCandidate { payload } => {
            hub.signal(session_id, crate::event::SignalKind::IceCandidate, payload)
                .await
        }
    }
}
