//! Hub WebSocket server.
//!
//! Listens on a TCP port, upgrades each connection to WebSocket, and runs
//! one independent receive loop per peer. All failures inside a
//! connection's loop are contained to that connection.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::accept_async_with_config;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tradelink_protocol::constants::{DEFAULT_HUB_PORT, SEND_BUFFER_SIZE, WS_MAX_MESSAGE_SIZE};
use tradelink_protocol::{Body, Envelope};

use crate::ServerError;
use crate::history::History;
use crate::registry::{ConnId, Registry};
use crate::router;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// TCP port to listen on (0 = OS-assigned).
    pub port: u16,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_HUB_PORT,
        }
    }
}

/// The A2A broadcast hub.
///
/// Holds the only two pieces of shared mutable state: the connection
/// [`Registry`] and the message [`History`].
pub struct HubServer {
    port: u16,
    registry: Registry,
    history: History,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
}

impl HubServer {
    pub fn new(config: HubConfig) -> Arc<Self> {
        Arc::new(Self {
            port: config.port,
            registry: Registry::new(),
            history: History::new(),
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Returns the listening port (0 if not yet bound).
    pub async fn port(&self) -> u16 {
        self.local_addr.lock().await.map(|a| a.port()).unwrap_or(0)
    }

    /// Number of currently connected peers.
    pub async fn peer_count(&self) -> usize {
        self.registry.len().await
    }

    /// Observed-message history, for introspection.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Gracefully shuts down the server and all connection loops.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until cancellation.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        let addr: SocketAddr = ([127, 0, 0, 1], self.port).into();
        let listener = TcpListener::bind(addr).await?;

        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        info!("hub listening on ws://{local_addr}");

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("hub shutting down");
                    break Ok(());
                }

                result = listener.accept() => {
                    match result {
                        Ok((stream, peer_addr)) => {
                            let server = Arc::clone(self);
                            tokio::spawn(async move {
                                if let Err(e) = server.handle_connection(stream, peer_addr).await {
                                    warn!(%peer_addr, "connection error: {e}");
                                }
                            });
                        }
                        Err(e) => {
                            warn!("accept error: {e}");
                        }
                    }
                }
            }
        }
    }

    /// Runs one peer's session: upgrade, register, receive loop, deregister.
    async fn handle_connection(
        self: &Arc<Self>,
        stream: tokio::net::TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<(), ServerError> {
        let ws_config = tokio_tungstenite::tungstenite::protocol::WebSocketConfig::default()
            .max_message_size(Some(WS_MAX_MESSAGE_SIZE))
            .max_frame_size(Some(WS_MAX_MESSAGE_SIZE));
        let ws_stream = accept_async_with_config(stream, Some(ws_config)).await?;
        info!(%peer_addr, "peer connected");

        let (write, mut read) = ws_stream.split();
        let (tx, rx) = mpsc::channel::<tungstenite::Message>(SEND_BUFFER_SIZE);

        let conn_cancel = self.cancel.child_token();
        let write_handle = tokio::spawn(write_pump(write, rx, conn_cancel.clone()));

        let id = self.registry.register(tx.clone(), peer_addr.to_string()).await;

        loop {
            tokio::select! {
                _ = conn_cancel.cancelled() => break,

                msg = read.next() => {
                    match msg {
                        Some(Ok(tungstenite::Message::Text(text))) => {
                            self.handle_text(id, &tx, &text).await;
                        }
                        Some(Ok(tungstenite::Message::Ping(data))) => {
                            let _ = tx.send(tungstenite::Message::Pong(data)).await;
                        }
                        Some(Ok(tungstenite::Message::Close(_))) => {
                            debug!(%peer_addr, "peer sent close frame");
                            break;
                        }
                        Some(Ok(_)) => {} // Pong and binary frames are ignored
                        Some(Err(e)) => {
                            warn!(%peer_addr, "read error: {e}");
                            break;
                        }
                        None => break,
                    }
                }
            }
        }

        self.registry.remove(id).await;
        conn_cancel.cancel();
        let _ = write_handle.await;
        info!(%peer_addr, "peer disconnected");
        Ok(())
    }

    /// Handles one text frame from a peer.
    ///
    /// Never fails out of the receive loop: a malformed frame is answered
    /// with a single `error` envelope and the session continues.
    async fn handle_text(&self, id: ConnId, tx: &mpsc::Sender<tungstenite::Message>, text: &str) {
        let env = match Envelope::decode(text) {
            Ok(env) => env,
            Err(e) => {
                warn!(conn = id, "undecodable message: {e}");
                self.send_direct(
                    tx,
                    Envelope::new(Body::Error {
                        message: "Invalid JSON format".into(),
                    }),
                )
                .await;
                return;
            }
        };

        info!(
            conn = id,
            kind = env.body.kind(),
            source = %env.source,
            "message received"
        );
        self.history.record(&env);
        if !env.source.is_empty() {
            self.registry.set_source(id, &env.source).await;
        }

        if router::should_broadcast(&env.body) {
            let delivered = self
                .registry
                .broadcast(env.clone().into_broadcast(), id)
                .await;
            debug!(conn = id, kind = env.body.kind(), delivered, "broadcast");
        }

        if let Some(reply) = router::classify_and_respond(&env) {
            self.send_direct(tx, reply).await;
        }
    }

    async fn send_direct(&self, tx: &mpsc::Sender<tungstenite::Message>, envelope: Envelope) {
        match envelope.encode() {
            Ok(json) => {
                if tx.send(tungstenite::Message::Text(json.into())).await.is_err() {
                    debug!("direct reply dropped, peer write pump gone");
                }
            }
            Err(e) => warn!("reply encode failed: {e}"),
        }
    }
}

/// Drains one peer's outbound queue into its WebSocket sink.
async fn write_pump<S>(
    mut write: S,
    mut rx: mpsc::Receiver<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: SinkExt<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            msg = rx.recv() => {
                match msg {
                    Some(m) => {
                        if let Err(e) = write.send(m).await {
                            debug!("write error: {e}");
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    let _ = write.send(tungstenite::Message::Close(None)).await;
}
