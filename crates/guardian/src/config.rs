//! Guardian configuration.

use std::time::Duration;

use tradelink_protocol::constants::DEFAULT_HUB_URL;

/// Tuning knobs for the guardian's loops and risk checks.
#[derive(Debug, Clone)]
pub struct GuardianConfig {
    /// Identity stamped on every outgoing envelope.
    pub agent_id: String,
    /// Hub endpoint the guardian connects to.
    pub hub_url: String,
    /// Wallet whose balance gates trade execution.
    pub wallet_address: String,
    /// JSON-RPC endpoint for gas and balance reads.
    pub rpc_url: String,
    /// Pairs polled by the market loop, as `BASE/QUOTE` strings.
    pub surveillance_pairs: Vec<String>,
    /// Confidence a high-risk peer signal must reach before execution.
    pub risk_threshold: f64,
    /// Confidence an anomaly must reach before an alert goes out.
    pub alert_threshold: f64,
    /// Peer signals below this confidence are ignored outright.
    pub min_confidence: f64,
    /// Delay between market surveillance sweeps.
    pub market_interval: Duration,
    /// Delay between wallet health reports.
    pub health_interval: Duration,
    /// Delay between transaction pool sweeps.
    pub tx_watch_interval: Duration,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            agent_id: "trading-guardian".to_string(),
            hub_url: DEFAULT_HUB_URL.to_string(),
            wallet_address: "0x1234567890123456789012345678901234567890".to_string(),
            rpc_url: "https://rpc.nad.fun".to_string(),
            surveillance_pairs: vec![
                "MONAD/ETH".to_string(),
                "MONAD/USDC".to_string(),
                "ETH/USDC".to_string(),
            ],
            risk_threshold: 0.7,
            alert_threshold: 0.85,
            min_confidence: 0.6,
            market_interval: Duration::from_secs(15),
            health_interval: Duration::from_secs(30),
            tx_watch_interval: Duration::from_secs(10),
        }
    }
}
