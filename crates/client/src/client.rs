//! The A2A client: one outbound hub connection per instance.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tradelink_protocol::constants::{DEFAULT_HUB_URL, HISTORY_CAP, SEND_BUFFER_SIZE};
use tradelink_protocol::{Body, Envelope, MarketDataQuery, SecurityAlert, TradeSignal};

use crate::handler::{Handler, LogHandler};
use crate::pumps;

/// Appends to a bounded introspection buffer, evicting oldest-first.
pub(crate) fn push_capped(buf: &std::sync::Mutex<VecDeque<Envelope>>, env: Envelope) {
    let mut buf = buf.lock().expect("buffer lock poisoned");
    if buf.len() == HISTORY_CAP {
        buf.pop_front();
    }
    buf.push_back(env);
}

/// Client connection to the A2A hub.
///
/// Cloning is cheap and shares the underlying connection; `send` may be
/// called from any task concurrently with the receive loop, since all
/// writes funnel through a single writer task.
#[derive(Clone)]
pub struct A2AClient {
    agent_id: Arc<str>,
    url: String,
    handler: Arc<dyn Handler>,
    connected: Arc<AtomicBool>,
    write_tx: Arc<tokio::sync::Mutex<Option<mpsc::Sender<tungstenite::Message>>>>,
    sent: Arc<std::sync::Mutex<VecDeque<Envelope>>>,
    received: Arc<std::sync::Mutex<VecDeque<Envelope>>>,
    cancel: Arc<std::sync::Mutex<Option<CancellationToken>>>,
}

impl A2AClient {
    /// Creates a disconnected client with the default hub URL and a
    /// log-only handler.
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into().into(),
            url: DEFAULT_HUB_URL.to_string(),
            handler: Arc::new(LogHandler),
            connected: Arc::new(AtomicBool::new(false)),
            write_tx: Arc::new(tokio::sync::Mutex::new(None)),
            sent: Arc::new(std::sync::Mutex::new(VecDeque::new())),
            received: Arc::new(std::sync::Mutex::new(VecDeque::new())),
            cancel: Arc::new(std::sync::Mutex::new(None)),
        }
    }

    /// Overrides the hub endpoint. Call before `connect`.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Installs a message handler. Call before `connect`.
    pub fn with_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handler = handler;
        self
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// Whether the connection was up at the last observation.
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Opens the transport, sends the handshake, and starts the
    /// background pumps. Returns `false` on any failure; the client is
    /// then left disconnected and no loop is running.
    pub async fn connect(&self) -> bool {
        // Tear down any previous session before dialing, so a failed
        // dial never leaves stale pumps behind a lowered connected flag.
        if let Some(old) = self.cancel.lock().expect("cancel lock poisoned").take() {
            old.cancel();
        }
        *self.write_tx.lock().await = None;
        self.connected.store(false, Ordering::SeqCst);

        info!(url = %self.url, agent = %self.agent_id, "connecting to hub");
        let (ws_stream, _) = match connect_async(self.url.as_str()).await {
            Ok(r) => r,
            Err(e) => {
                warn!("hub connection failed: {e} (is the hub running?)");
                return false;
            }
        };

        let (write, read) = ws_stream.split();
        let (tx, rx) = mpsc::channel::<tungstenite::Message>(SEND_BUFFER_SIZE);
        let cancel = CancellationToken::new();

        tokio::spawn(pumps::write::write_pump(write, rx, cancel.clone()));
        tokio::spawn(pumps::ping::ping_pump(tx.clone(), cancel.clone()));
        tokio::spawn(pumps::read::read_pump(
            read,
            self.handler.clone(),
            self.received.clone(),
            self.connected.clone(),
            tx.clone(),
            cancel.clone(),
        ));

        *self.write_tx.lock().await = Some(tx);
        *self.cancel.lock().expect("cancel lock poisoned") = Some(cancel);
        self.connected.store(true, Ordering::SeqCst);

        if !self.send(Envelope::new(Body::Handshake)).await {
            warn!("handshake send failed");
            self.disconnect().await;
            return false;
        }

        info!("connected to hub");
        true
    }

    /// Closes the connection and stops the pumps.
    pub async fn disconnect(&self) {
        if let Some(cancel) = self.cancel.lock().expect("cancel lock poisoned").take() {
            cancel.cancel();
        }
        *self.write_tx.lock().await = None;
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Stamps the envelope with this agent's identity and transmits it.
    ///
    /// A no-op returning `false` when not connected; `false` on transport
    /// failure, which also marks the connection dead. Does not reconnect.
    pub async fn send(&self, mut envelope: Envelope) -> bool {
        if !self.connected() {
            warn!(kind = envelope.body.kind(), "not connected to hub, dropping");
            return false;
        }

        envelope.stamp(&self.agent_id);
        let json = match envelope.encode() {
            Ok(j) => j,
            Err(e) => {
                warn!("encode failed: {e}");
                return false;
            }
        };

        let tx = self.write_tx.lock().await.clone();
        let Some(tx) = tx else {
            return false;
        };
        if tx.send(tungstenite::Message::Text(json.into())).await.is_err() {
            warn!(kind = envelope.body.kind(), "send failed, connection lost");
            self.connected.store(false, Ordering::SeqCst);
            return false;
        }

        info!(kind = envelope.body.kind(), "sent");
        push_capped(&self.sent, envelope);
        true
    }

    /// Broadcasts a trade signal to the network.
    pub async fn broadcast_trade_signal(&self, signal: TradeSignal) -> bool {
        self.send(Envelope::new(Body::TradeSignal { payload: signal }))
            .await
    }

    /// Broadcasts a security alert to the network.
    pub async fn broadcast_security_alert(&self, alert: SecurityAlert) -> bool {
        self.send(Envelope::new(Body::SecurityAlert { payload: alert }))
            .await
    }

    /// Requests a quote for one pair; the response arrives via
    /// [`Handler::on_market_data`].
    pub async fn request_market_data(&self, pair: &str) -> bool {
        self.send(Envelope::new(Body::MarketDataRequest {
            payload: MarketDataQuery { pair: pair.into() },
        }))
        .await
    }

    /// Snapshot of everything sent on this connection, oldest first.
    pub fn sent_messages(&self) -> Vec<Envelope> {
        self.sent
            .lock()
            .expect("buffer lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    /// Snapshot of everything received on this connection, oldest first.
    pub fn received_messages(&self) -> Vec<Envelope> {
        self.received
            .lock()
            .expect("buffer lock poisoned")
            .iter()
            .cloned()
            .collect()
    }
}
