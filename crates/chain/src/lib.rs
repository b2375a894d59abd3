//! Blockchain read access and simulated market data.
//!
//! A thin JSON-RPC wrapper for the read calls the monitoring loops need
//! (`eth_gasPrice`, `eth_getBalance`), falling back to mocked values when
//! the endpoint is unreachable, plus a simulated DEX feed for pair quotes
//! and swap execution. Not a production blockchain client.

mod market;
mod rpc;

pub use market::{PairQuote, SwapReceipt, simulated_quote};
pub use rpc::{AccountBalance, ChainClient, DEFAULT_GAS_PRICE_WEI};

/// Errors from the RPC layer.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("invalid hex quantity: {0}")]
    InvalidHex(String),
}
