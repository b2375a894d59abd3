//! JSON-RPC read calls with mocked fallbacks.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::ChainError;
use crate::market::{PairQuote, SwapReceipt, simulated_quote, simulated_swap};

/// Fallback gas price when the RPC endpoint is unreachable: 1.2 gwei.
pub const DEFAULT_GAS_PRICE_WEI: u64 = 1_200_000_000;

const WEI_PER_ETH: f64 = 1e18;

/// Balance of one account, in native units and wei.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub address: String,
    pub balance: f64,
    pub balance_wei: u128,
}

/// Read-only chain access for the monitoring loops.
///
/// Every public method degrades to a mocked value instead of failing, so
/// a dead RPC endpoint never stops surveillance.
pub struct ChainClient {
    http: reqwest::Client,
    rpc_url: String,
}

impl ChainClient {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.into(),
        }
    }

    /// One JSON-RPC call, returning the raw `result` value.
    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, ChainError> {
        let id: String = uuid::Uuid::new_v4().to_string().chars().take(8).collect();
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        let response: serde_json::Value = self
            .http
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        if let Some(err) = response.get("error") {
            return Err(ChainError::Rpc(err.to_string()));
        }
        response
            .get("result")
            .cloned()
            .ok_or_else(|| ChainError::Rpc("missing result field".into()))
    }

    /// Current gas price in wei, or the 1.2 gwei fallback on any failure.
    pub async fn gas_price(&self) -> u64 {
        match self.try_gas_price().await {
            Ok(price) => price,
            Err(e) => {
                warn!("gas price lookup failed, using fallback: {e}");
                DEFAULT_GAS_PRICE_WEI
            }
        }
    }

    async fn try_gas_price(&self) -> Result<u64, ChainError> {
        let result = self.rpc_call("eth_gasPrice", serde_json::json!([])).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| ChainError::Rpc("non-string gas price".into()))?;
        Ok(parse_hex_quantity(hex)? as u64)
    }

    /// Account balance, or a zero balance on any failure.
    pub async fn account_balance(&self, address: &str) -> AccountBalance {
        match self.try_account_balance(address).await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(%address, "balance lookup failed, reporting zero: {e}");
                AccountBalance {
                    address: address.to_string(),
                    balance: 0.0,
                    balance_wei: 0,
                }
            }
        }
    }

    async fn try_account_balance(&self, address: &str) -> Result<AccountBalance, ChainError> {
        let result = self
            .rpc_call("eth_getBalance", serde_json::json!([address, "latest"]))
            .await?;
        let hex = result
            .as_str()
            .ok_or_else(|| ChainError::Rpc("non-string balance".into()))?;
        let wei = parse_hex_quantity(hex)?;
        Ok(AccountBalance {
            address: address.to_string(),
            balance: wei as f64 / WEI_PER_ETH,
            balance_wei: wei,
        })
    }

    /// Quote for a trading pair. Always simulated; a real DEX feed is out
    /// of scope.
    pub async fn pair_info(&self, base: &str, quote: &str) -> PairQuote {
        simulated_quote(base, quote)
    }

    /// Executes a simulated swap against the current simulated quote.
    pub async fn simulate_swap(
        &self,
        wallet: &str,
        token_in: &str,
        token_out: &str,
        amount_in: f64,
    ) -> SwapReceipt {
        let quote = self.pair_info(token_in, token_out).await;
        simulated_swap(wallet, &quote, amount_in)
    }
}

/// Parses an `0x`-prefixed hex quantity.
fn parse_hex_quantity(hex: &str) -> Result<u128, ChainError> {
    let digits = hex
        .strip_prefix("0x")
        .ok_or_else(|| ChainError::InvalidHex(hex.to_string()))?;
    u128::from_str_radix(digits, 16).map_err(|_| ChainError::InvalidHex(hex.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_quantities() {
        assert_eq!(parse_hex_quantity("0x0").unwrap(), 0);
        assert_eq!(
            parse_hex_quantity("0x1bc16d674ec80000").unwrap(),
            2_000_000_000_000_000_000
        );
        assert!(parse_hex_quantity("1234").is_err(), "missing prefix");
        assert!(parse_hex_quantity("0xzz").is_err());
    }

    #[tokio::test]
    async fn gas_price_falls_back_when_unreachable() {
        // Nothing listens on the discard port.
        let client = ChainClient::new("http://127.0.0.1:9");
        assert_eq!(client.gas_price().await, DEFAULT_GAS_PRICE_WEI);
    }

    #[tokio::test]
    async fn balance_falls_back_to_zero_when_unreachable() {
        let client = ChainClient::new("http://127.0.0.1:9");
        let balance = client.account_balance("0xabc").await;
        assert_eq!(balance.balance_wei, 0);
        assert_eq!(balance.balance, 0.0);
        assert_eq!(balance.address, "0xabc");
    }
}
