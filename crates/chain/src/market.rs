//! Simulated DEX feed.
//!
//! Quotes are drawn around fixed base prices with bounded jitter so the
//! anomaly detectors downstream see realistic, mostly-stable data.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Base prices for the pairs the simulation knows about. Unknown pairs
/// quote around 1.0.
const BASE_PRICES: [(&str, &str, f64); 4] = [
    ("MONAD", "ETH", 0.0012),
    ("MONAD", "USDC", 0.45),
    ("ETH", "USDC", 3800.0),
    ("WBTC", "USDC", 70000.0),
];

/// One simulated pair quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairQuote {
    pub pair_address: String,
    pub price: f64,
    pub liquidity: f64,
    pub volume_24h: f64,
    pub tvl: f64,
}

/// Result of a simulated swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapReceipt {
    pub transaction_hash: String,
    pub from: String,
    pub to: String,
    pub amount_in: f64,
    pub amount_out: f64,
    pub price_impact: f64,
    pub gas_used: u64,
}

fn base_price(base: &str, quote: &str) -> f64 {
    BASE_PRICES
        .iter()
        .find(|(b, q, _)| (*b == base && *q == quote) || (*b == quote && *q == base))
        .map(|(_, _, p)| *p)
        .unwrap_or(1.0)
}

/// Synthesizes a quote for a pair: base price ±5%, random liquidity and
/// volume in the feed's usual ranges.
pub fn simulated_quote(base: &str, quote: &str) -> PairQuote {
    let mut rng = rand::rng();
    let price = base_price(base, quote) * rng.random_range(0.95..1.05);
    let liquidity = rng.random_range(100_000.0..10_000_000.0);
    PairQuote {
        pair_address: format!("0x{:040x}", rng.random::<u64>()),
        price,
        liquidity,
        volume_24h: rng.random_range(50_000.0..5_000_000.0),
        tvl: liquidity,
    }
}

/// Applies 0.1-1% slippage and price impact to produce a swap receipt.
pub(crate) fn simulated_swap(wallet: &str, quote: &PairQuote, amount_in: f64) -> SwapReceipt {
    let mut rng = rand::rng();
    let slippage = rng.random_range(0.001..0.01);
    SwapReceipt {
        transaction_hash: format!("0x{:064x}", rng.random::<u128>()),
        from: wallet.to_string(),
        to: quote.pair_address.clone(),
        amount_in,
        amount_out: amount_in * quote.price * (1.0 - slippage),
        price_impact: rng.random_range(0.001..0.02),
        gas_used: rng.random_range(100_000..300_000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pair_quotes_near_base_price() {
        for _ in 0..50 {
            let q = simulated_quote("MONAD", "ETH");
            assert!(q.price >= 0.0012 * 0.95 && q.price <= 0.0012 * 1.05);
            assert!(q.liquidity.is_finite() && q.liquidity >= 100_000.0);
            assert!(q.volume_24h.is_finite() && q.volume_24h >= 0.0);
        }
    }

    #[test]
    fn pair_lookup_is_order_insensitive() {
        // ETH/MONAD resolves to the MONAD/ETH base price.
        assert_eq!(base_price("ETH", "MONAD"), 0.0012);
        assert_eq!(base_price("USDC", "ETH"), 3800.0);
    }

    #[test]
    fn unknown_pair_quotes_around_one() {
        let q = simulated_quote("FOO", "BAR");
        assert!(q.price >= 0.95 && q.price <= 1.05);
    }

    #[test]
    fn swap_applies_slippage() {
        let quote = PairQuote {
            pair_address: "0xpair".into(),
            price: 2.0,
            liquidity: 1_000_000.0,
            volume_24h: 100_000.0,
            tvl: 1_000_000.0,
        };
        let receipt = simulated_swap("0xwallet", &quote, 10.0);
        assert!(receipt.transaction_hash.starts_with("0x"));
        assert!(receipt.amount_out < 10.0 * 2.0);
        assert!(receipt.amount_out > 10.0 * 2.0 * 0.99);
        assert!((100_000..300_000).contains(&receipt.gas_used));
        assert_eq!(receipt.from, "0xwallet");
    }
}
