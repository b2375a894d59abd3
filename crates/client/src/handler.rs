//! Handler trait for incoming hub messages.
//!
//! The receive loop dispatches each decoded envelope to the matching
//! method. Default implementations log and move on, so consumers only
//! override the message types they care about.

use std::future::Future;
use std::pin::Pin;

use tracing::{info, warn};

use tradelink_protocol::{SecurityAlert, TradeSignal};

/// A boxed future returned by handler methods.
pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Receives messages dispatched by the client's receive loop.
pub trait Handler: Send + Sync + 'static {
    /// Called when the hub confirms the handshake.
    fn on_handshake_confirmed(&self, status: String) -> HandlerFuture<'_> {
        Box::pin(async move {
            info!(%status, "handshake confirmed");
        })
    }

    /// Called for a relayed `trade_signal` from a peer agent.
    fn on_trade_signal(&self, source: String, signal: TradeSignal) -> HandlerFuture<'_> {
        Box::pin(async move {
            info!(
                %source,
                pair = %signal.pair,
                direction = %signal.direction,
                price = signal.price,
                "trade signal received"
            );
        })
    }

    /// Called for a relayed `security_alert` from a peer agent.
    fn on_security_alert(&self, source: String, alert: SecurityAlert) -> HandlerFuture<'_> {
        Box::pin(async move {
            warn!(
                %source,
                alert_type = %alert.alert_type,
                severity = alert.severity,
                description = %alert.description,
                "security alert received"
            );
        })
    }

    /// Called for a `market_data_response`.
    fn on_market_data(
        &self,
        pair: String,
        price: f64,
        liquidity: f64,
        volume_24h: f64,
    ) -> HandlerFuture<'_> {
        Box::pin(async move {
            info!(%pair, price, liquidity, volume_24h, "market data received");
        })
    }

    /// Called for an `error` envelope from the hub.
    fn on_hub_error(&self, message: String) -> HandlerFuture<'_> {
        Box::pin(async move {
            warn!(%message, "hub reported an error");
        })
    }

    /// Called once when the connection closes (cleanup hook).
    fn on_disconnected(&self) -> HandlerFuture<'_> {
        Box::pin(async {})
    }
}

/// Default handler: logs every message, handles nothing.
pub struct LogHandler;

impl Handler for LogHandler {}
