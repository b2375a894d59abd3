//! Market surveillance agent.
//!
//! Periodic loops poll the simulated market feed, run threshold-based
//! anomaly checks, and broadcast alerts over the A2A network. Incoming
//! peer trade signals are risk-checked and executed as simulated swaps.

mod anomaly;
mod config;
mod guardian;

pub use anomaly::{PricePoint, liquidity_anomaly, price_anomaly};
pub use config::GuardianConfig;
pub use guardian::{Guardian, TradeRecord};
