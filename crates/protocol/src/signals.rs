//! Domain payloads carried inside envelopes.
//!
//! The hub treats these as opaque; they are shared here so producers and
//! consumers agree on field names.

use serde::{Deserialize, Serialize};

/// A proposed trade, broadcast to every other agent on the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSignal {
    pub id: String,
    /// Trading pair, e.g. `"MONAD/ETH"`.
    pub pair: String,
    /// `"BUY"` or `"SELL"`.
    pub direction: String,
    pub amount: f64,
    pub price: f64,
    /// Signal confidence in `[0, 1]`.
    pub confidence: f64,
    /// `"low"`, `"medium"` or `"high"`.
    pub risk_level: String,
}

/// A detected market anomaly, broadcast to every other agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityAlert {
    pub id: String,
    /// e.g. `"flash_crash"`, `"liquidity_drop"`.
    pub alert_type: String,
    /// Severity on a 0-10 scale.
    pub severity: i32,
    pub affected_pairs: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub related_tx_hashes: Vec<String>,
}

/// The pair an agent wants a quote for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketDataQuery {
    pub pair: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trade_signal_json_field_names() {
        let sig = TradeSignal {
            id: "s1".into(),
            pair: "MONAD/USDC".into(),
            direction: "SELL".into(),
            amount: 12.5,
            price: 0.45,
            confidence: 0.9,
            risk_level: "low".into(),
        };
        let value = serde_json::to_value(&sig).unwrap();
        for key in [
            "id",
            "pair",
            "direction",
            "amount",
            "price",
            "confidence",
            "risk_level",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn security_alert_defaults_tx_hashes() {
        let alert: SecurityAlert = serde_json::from_str(
            r#"{"id":"a1","alert_type":"flash_crash","severity":9,
                "affected_pairs":["MONAD/ETH"],"description":"rapid move"}"#,
        )
        .unwrap();
        assert!(alert.related_tx_hashes.is_empty());
        assert_eq!(alert.severity, 9);
    }
}
