//! WebSocket read pump: the background receive loop for one connection.
//!
//! Decodes one message at a time and dispatches it to the handler. A
//! decode failure is logged and skipped; only transport-level events end
//! the loop, at which point the connected flag is lowered.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use tradelink_protocol::{Body, Envelope};

use crate::client::push_capped;
use crate::handler::Handler;

pub(crate) async fn read_pump<S>(
    mut read: S,
    handler: Arc<dyn Handler>,
    received: Arc<std::sync::Mutex<VecDeque<Envelope>>>,
    connected: Arc<AtomicBool>,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            msg = read.next() => {
                match msg {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        handle_text(&text, &handler, &received).await;
                    }
                    Some(Ok(tungstenite::Message::Ping(data))) => {
                        let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                    }
                    Some(Ok(tungstenite::Message::Close(_))) => {
                        debug!("hub sent close frame");
                        break;
                    }
                    Some(Ok(_)) => {} // Pong and binary frames are ignored
                    Some(Err(e)) => {
                        warn!("read error: {e}");
                        break;
                    }
                    None => {
                        debug!("stream ended");
                        break;
                    }
                }
            }
        }
    }

    connected.store(false, Ordering::SeqCst);
    info!("hub connection closed");
    handler.on_disconnected().await;
}

/// Decodes and dispatches one text frame. Per-message failures are
/// non-fatal.
async fn handle_text(
    text: &str,
    handler: &Arc<dyn Handler>,
    received: &Arc<std::sync::Mutex<VecDeque<Envelope>>>,
) {
    let env = match Envelope::decode(text) {
        Ok(env) => env,
        Err(e) => {
            warn!("skipping undecodable message: {e}");
            return;
        }
    };

    debug!(kind = env.body.kind(), source = %env.source, "message received");
    let source = env.source.clone();
    push_capped(received, env.clone());

    match env.body {
        Body::HandshakeResponse { status, .. } => {
            handler.on_handshake_confirmed(status).await;
        }
        Body::TradeSignal { payload } => {
            handler.on_trade_signal(source, payload).await;
        }
        Body::SecurityAlert { payload } => {
            handler.on_security_alert(source, payload).await;
        }
        Body::MarketDataResponse {
            pair,
            price,
            liquidity,
            volume_24h,
        } => {
            handler.on_market_data(pair, price, liquidity, volume_24h).await;
        }
        Body::Error { message } => {
            handler.on_hub_error(message).await;
        }
        // Acks and anything unrecognized stay in the received buffer only.
        other => debug!(kind = other.kind(), "no dispatch for message type"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerFuture;
    use futures_util::stream;
    use tradelink_protocol::TradeSignal;

    struct Capture {
        signals: std::sync::Mutex<Vec<(String, TradeSignal)>>,
        disconnected: AtomicBool,
    }

    impl Capture {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                signals: std::sync::Mutex::new(Vec::new()),
                disconnected: AtomicBool::new(false),
            })
        }
    }

    impl Handler for Capture {
        fn on_trade_signal(&self, source: String, signal: TradeSignal) -> HandlerFuture<'_> {
            Box::pin(async move {
                self.signals.lock().unwrap().push((source, signal));
            })
        }

        fn on_disconnected(&self) -> HandlerFuture<'_> {
            self.disconnected.store(true, Ordering::SeqCst);
            Box::pin(async {})
        }
    }

    fn text(t: &str) -> Result<tungstenite::Message, tungstenite::Error> {
        Ok(tungstenite::Message::Text(t.to_string().into()))
    }

    #[tokio::test]
    async fn garbage_is_skipped_and_loop_continues() {
        let capture = Capture::new();
        let received = Arc::new(std::sync::Mutex::new(VecDeque::new()));
        let connected = Arc::new(AtomicBool::new(true));
        let (write_tx, _write_rx) = mpsc::channel(16);

        let messages = stream::iter(vec![
            text("%%% not json %%%"),
            text(
                r#"{"type":"trade_signal","source":"agent-7","timestamp":1.0,"broadcast":true,"payload":{"id":"s9","pair":"ETH/USDC","direction":"SELL","amount":2,"price":3800.0,"confidence":0.7,"risk_level":"low"}}"#,
            ),
        ]);

        read_pump(
            messages,
            capture.clone(),
            received.clone(),
            connected.clone(),
            write_tx,
            CancellationToken::new(),
        )
        .await;

        let signals = capture.signals.lock().unwrap();
        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].0, "agent-7");
        assert_eq!(signals[0].1.id, "s9");
        assert_eq!(received.lock().unwrap().len(), 1, "garbage not buffered");
    }

    #[tokio::test]
    async fn stream_end_lowers_connected_and_fires_disconnect() {
        let capture = Capture::new();
        let received = Arc::new(std::sync::Mutex::new(VecDeque::new()));
        let connected = Arc::new(AtomicBool::new(true));
        let (write_tx, _write_rx) = mpsc::channel(16);

        let empty = stream::empty::<Result<tungstenite::Message, tungstenite::Error>>();
        read_pump(
            empty,
            capture.clone(),
            received,
            connected.clone(),
            write_tx,
            CancellationToken::new(),
        )
        .await;

        assert!(!connected.load(Ordering::SeqCst));
        assert!(capture.disconnected.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn acks_are_buffered_without_dispatch() {
        let capture = Capture::new();
        let received = Arc::new(std::sync::Mutex::new(VecDeque::new()));
        let connected = Arc::new(AtomicBool::new(true));
        let (write_tx, _write_rx) = mpsc::channel(16);

        let messages = stream::iter(vec![text(
            r#"{"type":"trade_signal_ack","status":"received","signal_id":"s1","timestamp":1.0}"#,
        )]);

        read_pump(
            messages,
            capture.clone(),
            received.clone(),
            connected,
            write_tx,
            CancellationToken::new(),
        )
        .await;

        assert!(capture.signals.lock().unwrap().is_empty());
        assert_eq!(received.lock().unwrap().len(), 1);
    }
}
