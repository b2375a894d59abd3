//! Envelope for all hub communication.
//!
//! The `type` tag is modeled as an internally-tagged enum so the hub's
//! classification is an exhaustive match: adding a message type without
//! handling it everywhere is a compile error. Unrecognized tags decode to
//! [`Body::Unknown`] instead of failing, since peers may speak newer
//! dialects.

use serde::{Deserialize, Serialize};

use crate::constants::epoch_now;
use crate::signals::{MarketDataQuery, SecurityAlert, TradeSignal};

/// Type-specific portion of a wire message, discriminated by `"type"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Body {
    /// First message a client sends after connecting.
    Handshake,
    /// Hub's reply to a `handshake`.
    HandshakeResponse {
        status: String,
        capabilities: Vec<String>,
    },
    /// Trade signal from one agent, rebroadcast by the hub to the rest.
    TradeSignal { payload: TradeSignal },
    /// Direct acknowledgement of a `trade_signal` to its sender.
    TradeSignalAck { status: String, signal_id: String },
    /// Security alert from one agent, rebroadcast by the hub to the rest.
    SecurityAlert { payload: SecurityAlert },
    /// Direct acknowledgement of a `security_alert` to its sender.
    SecurityAlertAck { status: String, alert_id: String },
    /// Request for a quote on one trading pair.
    MarketDataRequest { payload: MarketDataQuery },
    /// Hub-synthesized quote for the requested pair.
    MarketDataResponse {
        pair: String,
        price: f64,
        liquidity: f64,
        volume_24h: f64,
    },
    /// Hub-side failure report, e.g. undecodable input.
    Error { message: String },
    /// Any tag this build does not recognize. Recorded in history,
    /// never dispatched.
    #[serde(other)]
    Unknown,
}

impl Body {
    /// Wire tag for logging. `Unknown` has no stable tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Body::Handshake => "handshake",
            Body::HandshakeResponse { .. } => "handshake_response",
            Body::TradeSignal { .. } => "trade_signal",
            Body::TradeSignalAck { .. } => "trade_signal_ack",
            Body::SecurityAlert { .. } => "security_alert",
            Body::SecurityAlertAck { .. } => "security_alert_ack",
            Body::MarketDataRequest { .. } => "market_data_request",
            Body::MarketDataResponse { .. } => "market_data_response",
            Body::Error { .. } => "error",
            Body::Unknown => "unknown",
        }
    }
}

fn is_false(v: &bool) -> bool {
    !v
}

/// The unit of exchange between agents and the hub.
///
/// `source` and `timestamp` are stamped by the sender immediately before
/// transmission; the two `broadcast` fields are appended only by the hub
/// when it relays a message, so optional fields stay off the wire for
/// direct traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    pub body: Body,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default, skip_serializing_if = "is_false")]
    pub broadcast: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast_timestamp: Option<f64>,
}

impl Envelope {
    /// Creates an envelope with the current time and no source.
    pub fn new(body: Body) -> Self {
        Self {
            body,
            source: String::new(),
            timestamp: epoch_now(),
            broadcast: false,
            broadcast_timestamp: None,
        }
    }

    /// Overwrites `source` and `timestamp` with the sender's identity and
    /// the current time. Callers cannot forge either field.
    pub fn stamp(&mut self, source: &str) {
        self.source = source.to_string();
        self.timestamp = epoch_now();
    }

    /// Marks this envelope as relayed by the hub.
    pub fn into_broadcast(mut self) -> Self {
        self.broadcast = true;
        self.broadcast_timestamp = Some(epoch_now());
        self
    }

    /// Serializes to one wire message.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses one wire message.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_all_fields() {
        let mut env = Envelope::new(Body::TradeSignal {
            payload: TradeSignal {
                id: "s1".into(),
                pair: "MONAD/ETH".into(),
                direction: "BUY".into(),
                amount: 100.0,
                price: 0.0012,
                confidence: 0.8,
                risk_level: "medium".into(),
            },
        });
        env.stamp("agent-1");

        let decoded = Envelope::decode(&env.encode().unwrap()).unwrap();
        assert_eq!(decoded, env);
    }

    #[test]
    fn decode_spec_trade_signal() {
        // Exactly the shape a peer sends: no source or timestamp yet.
        let text = r#"{"type":"trade_signal","payload":{"id":"s1","pair":"MONAD/ETH","direction":"BUY","amount":100,"price":0.0012,"confidence":0.8,"risk_level":"medium"}}"#;
        let env = Envelope::decode(text).unwrap();
        match &env.body {
            Body::TradeSignal { payload } => {
                assert_eq!(payload.id, "s1");
                assert_eq!(payload.pair, "MONAD/ETH");
                assert_eq!(payload.direction, "BUY");
                assert_eq!(payload.amount, 100.0);
            }
            other => panic!("wrong body: {other:?}"),
        }
        assert!(env.source.is_empty());
        assert_eq!(env.timestamp, 0.0);
        assert!(!env.broadcast);
    }

    #[test]
    fn ack_wire_shape() {
        let mut env = Envelope::new(Body::TradeSignalAck {
            status: "received".into(),
            signal_id: "s1".into(),
        });
        env.timestamp = 1.5;
        let value: serde_json::Value = serde_json::from_str(&env.encode().unwrap()).unwrap();
        assert_eq!(value["type"], "trade_signal_ack");
        assert_eq!(value["status"], "received");
        assert_eq!(value["signal_id"], "s1");
        assert_eq!(value["timestamp"], 1.5);
    }

    #[test]
    fn direct_traffic_omits_broadcast_fields() {
        let env = Envelope::new(Body::Handshake);
        let json = env.encode().unwrap();
        assert!(!json.contains("broadcast"));
        assert!(!json.contains("source"));
    }

    #[test]
    fn relayed_envelope_carries_broadcast_marker() {
        let mut env = Envelope::new(Body::Handshake);
        env.stamp("agent-1");
        let env = env.into_broadcast();
        let value: serde_json::Value = serde_json::from_str(&env.encode().unwrap()).unwrap();
        assert_eq!(value["broadcast"], true);
        assert!(value["broadcast_timestamp"].as_f64().unwrap() > 0.0);
        assert_eq!(value["source"], "agent-1");
    }

    #[test]
    fn unrecognized_type_decodes_to_unknown() {
        let env =
            Envelope::decode(r#"{"type":"telemetry_burst","source":"agent-9","timestamp":3.0}"#)
                .unwrap();
        assert_eq!(env.body, Body::Unknown);
        assert_eq!(env.source, "agent-9");
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(Envelope::decode("not json at all").is_err());
        assert!(Envelope::decode(r#"{"no_type_tag":1}"#).is_err());
    }

    #[test]
    fn extra_fields_are_tolerated() {
        // Protocol evolution adds optional fields; old builds must not choke.
        let text = r#"{"type":"handshake","source":"a","timestamp":1.0,"session_hint":"xyz"}"#;
        let env = Envelope::decode(text).unwrap();
        assert_eq!(env.body, Body::Handshake);
    }

    #[test]
    fn stamp_overwrites_caller_values() {
        let mut env = Envelope::new(Body::Handshake);
        env.source = "forged".into();
        env.timestamp = -1.0;
        env.stamp("agent-1");
        assert_eq!(env.source, "agent-1");
        assert!(env.timestamp > 0.0);
    }

    #[test]
    fn body_kind_labels() {
        assert_eq!(Body::Handshake.kind(), "handshake");
        assert_eq!(
            Body::Error {
                message: "x".into()
            }
            .kind(),
            "error"
        );
    }
}
