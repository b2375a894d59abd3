//! Stateless per-message classification.
//!
//! There is no broader state machine: each envelope is handled purely on
//! its type. The match is exhaustive so a new `Body` variant cannot be
//! added without deciding its hub behavior here.

use rand::Rng;

use tradelink_protocol::constants::HUB_CAPABILITIES;
use tradelink_protocol::{Body, Envelope};

/// Returns the direct reply owed to the sender, if any.
pub fn classify_and_respond(envelope: &Envelope) -> Option<Envelope> {
    let body = match &envelope.body {
        Body::Handshake => Some(Body::HandshakeResponse {
            status: "connected".into(),
            capabilities: HUB_CAPABILITIES.iter().map(|c| c.to_string()).collect(),
        }),
        Body::TradeSignal { payload } => Some(Body::TradeSignalAck {
            status: "received".into(),
            signal_id: payload.id.clone(),
        }),
        Body::SecurityAlert { payload } => Some(Body::SecurityAlertAck {
            status: "received".into(),
            alert_id: payload.id.clone(),
        }),
        Body::MarketDataRequest { payload } => Some(synthesize_quote(&payload.pair)),

        // Hub-originated shapes arriving inbound, and anything
        // unrecognized: recorded in history by the caller, no reply.
        Body::HandshakeResponse { .. }
        | Body::TradeSignalAck { .. }
        | Body::SecurityAlertAck { .. }
        | Body::MarketDataResponse { .. }
        | Body::Error { .. }
        | Body::Unknown => None,
    };
    body.map(Envelope::new)
}

/// Whether this message type is fanned out to the other peers.
pub fn should_broadcast(body: &Body) -> bool {
    matches!(body, Body::TradeSignal { .. } | Body::SecurityAlert { .. })
}

/// Synthesizes a quote for the requested pair.
///
/// The hub carries no market state; values are drawn from the same ranges
/// the simulated feed uses so downstream consumers see plausible numbers.
fn synthesize_quote(pair: &str) -> Body {
    let mut rng = rand::rng();
    Body::MarketDataResponse {
        pair: pair.to_string(),
        price: rng.random_range(1.0..100.0),
        liquidity: rng.random_range(100_000.0..10_000_000.0),
        volume_24h: rng.random_range(50_000.0..5_000_000.0),
    }
}
