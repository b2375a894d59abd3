//! TradeLink daemon entry point.
//!
//! Starts the local A2A hub, connects a guardian agent to it, feeds one
//! demo trade signal through the risk pipeline, and runs until ctrl-c.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use tradelink_guardian::{Guardian, GuardianConfig};
use tradelink_hub::{HubConfig, HubServer};
use tradelink_protocol::TradeSignal;
use tradelink_protocol::constants::DEFAULT_HUB_PORT;

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "starting TradeLink daemon"
    );

    let port: u16 = match env_or("TRADELINK_HUB_PORT", "").parse() {
        Ok(p) => p,
        Err(_) => DEFAULT_HUB_PORT,
    };
    let config = GuardianConfig {
        agent_id: env_or("TRADELINK_AGENT_ID", "trading-guardian"),
        hub_url: format!("ws://localhost:{port}"),
        wallet_address: env_or(
            "MONAD_WALLET_ADDRESS",
            "0x1234567890123456789012345678901234567890",
        ),
        rpc_url: env_or("MONAD_RPC_URL", "https://rpc.nad.fun"),
        ..GuardianConfig::default()
    };
    tracing::info!(wallet = %config.wallet_address, rpc = %config.rpc_url, "configured");

    let server = HubServer::new(HubConfig { port });
    let hub = Arc::clone(&server);
    tokio::spawn(async move {
        if let Err(e) = hub.run().await {
            tracing::error!("hub stopped: {e}");
        }
    });

    // Give the listener a moment before the guardian dials in.
    tokio::time::sleep(Duration::from_millis(200)).await;

    let cancel = CancellationToken::new();
    let guardian = Guardian::new(config);
    guardian.start(cancel.clone()).await;

    // One demo signal so a fresh start shows the whole pipeline working.
    tokio::time::sleep(Duration::from_secs(2)).await;
    let demo = TradeSignal {
        id: uuid::Uuid::new_v4().to_string(),
        pair: "MONAD/ETH".to_string(),
        direction: "BUY".to_string(),
        amount: 100.0,
        price: 0.0012,
        confidence: 0.8,
        risk_level: "medium".to_string(),
    };
    tracing::info!("analyzing demo trade opportunity");
    guardian.analyze_trading_opportunity("demo", &demo).await;

    tracing::info!("daemon running, ctrl-c to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("signal listener failed: {e}");
    }

    tracing::info!("shutting down");
    cancel.cancel();
    guardian.client().disconnect().await;
    server.shutdown();
}
