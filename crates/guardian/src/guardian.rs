//! The guardian agent: surveillance loops, risk checks, and alerting.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tradelink_chain::ChainClient;
use tradelink_client::{A2AClient, Handler, HandlerFuture};
use tradelink_protocol::constants::epoch_now;
use tradelink_protocol::{SecurityAlert, TradeSignal};

use crate::anomaly::{self, PRICE_HISTORY_CAP, PricePoint};
use crate::config::GuardianConfig;

/// One executed (simulated) trade.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    pub timestamp: f64,
    pub pair: String,
    pub direction: String,
    pub amount: f64,
    pub price: f64,
    pub tx_hash: String,
    pub pnl: f64,
}

/// State shared between the loops and the incoming-signal handler.
struct GuardianInner {
    config: GuardianConfig,
    chain: ChainClient,
    price_history: Mutex<HashMap<String, VecDeque<PricePoint>>>,
    alert_history: Mutex<Vec<SecurityAlert>>,
    trade_history: Mutex<Vec<TradeRecord>>,
}

impl GuardianInner {
    /// Risk-checks a peer trade signal and executes it as a simulated
    /// swap when it passes.
    async fn analyze_trading_opportunity(&self, source: &str, signal: &TradeSignal) {
        if signal.confidence < self.config.min_confidence {
            info!(
                %source,
                pair = %signal.pair,
                confidence = signal.confidence,
                "low confidence signal ignored"
            );
            return;
        }
        if signal.risk_level.eq_ignore_ascii_case("high")
            && signal.confidence < self.config.risk_threshold
        {
            info!(
                %source,
                pair = %signal.pair,
                confidence = signal.confidence,
                "high-risk signal below risk threshold, ignored"
            );
            return;
        }

        let wallet = self.chain.account_balance(&self.config.wallet_address).await;
        let balance = wallet.balance;

        let direction = signal.direction.to_ascii_uppercase();
        let max_risk_per_trade = balance * 0.02;
        let position_size = if direction == "BUY" {
            if signal.price > 0.0 {
                signal.amount.min(max_risk_per_trade / signal.price)
            } else {
                0.0
            }
        } else {
            signal.amount.min(balance * 0.1)
        };

        if position_size <= 0.0 || balance <= 0.001 {
            warn!(
                pair = %signal.pair,
                balance,
                "trade rejected, insufficient funds or zero position"
            );
            return;
        }

        let Some((base, quote)) = signal.pair.split_once('/') else {
            warn!(pair = %signal.pair, "malformed pair in trade signal");
            return;
        };

        info!(
            %direction,
            pair = %signal.pair,
            position_size,
            price = signal.price,
            "trade validated"
        );

        // A BUY acquires the base asset by spending the quote asset.
        let (token_in, token_out, amount_in) = if direction == "BUY" {
            (quote, base, position_size * signal.price)
        } else {
            (base, quote, position_size)
        };
        let receipt = self
            .chain
            .simulate_swap(&self.config.wallet_address, token_in, token_out, amount_in)
            .await;
        info!(
            tx = %receipt.transaction_hash,
            amount_out = receipt.amount_out,
            "trade executed"
        );

        let pnl = rand::rng().random_range(-0.02..0.05);
        self.trade_history
            .lock()
            .expect("trade history lock poisoned")
            .push(TradeRecord {
                timestamp: epoch_now(),
                pair: signal.pair.clone(),
                direction,
                amount: position_size,
                price: signal.price,
                tx_hash: receipt.transaction_hash,
                pnl,
            });
    }
}

/// Routes relayed peer signals into the guardian's risk pipeline.
struct SignalHandler {
    inner: Arc<GuardianInner>,
}

impl Handler for SignalHandler {
    fn on_trade_signal(&self, source: String, signal: TradeSignal) -> HandlerFuture<'_> {
        Box::pin(async move {
            self.inner.analyze_trading_opportunity(&source, &signal).await;
        })
    }
}

/// Market surveillance agent.
///
/// Owns one hub connection and three periodic loops. Cloning shares all
/// state; the loops hold a clone each.
#[derive(Clone)]
pub struct Guardian {
    inner: Arc<GuardianInner>,
    client: A2AClient,
}

impl Guardian {
    pub fn new(config: GuardianConfig) -> Self {
        let inner = Arc::new(GuardianInner {
            chain: ChainClient::new(config.rpc_url.clone()),
            price_history: Mutex::new(HashMap::new()),
            alert_history: Mutex::new(Vec::new()),
            trade_history: Mutex::new(Vec::new()),
            config,
        });
        let client = A2AClient::new(inner.config.agent_id.clone())
            .with_url(inner.config.hub_url.clone())
            .with_handler(Arc::new(SignalHandler {
                inner: Arc::clone(&inner),
            }));
        Self { inner, client }
    }

    pub fn client(&self) -> &A2AClient {
        &self.client
    }

    /// Connects to the hub. A failure leaves the guardian in local mode:
    /// monitoring keeps running, alerts just stay local.
    pub async fn connect(&self) -> bool {
        self.client.connect().await
    }

    /// Connects (best effort) and starts the monitoring loops. The loops
    /// run until `cancel` fires.
    pub async fn start(&self, cancel: CancellationToken) {
        if !self.connect().await {
            warn!("hub unavailable, running in local mode");
        }

        let market = self.clone();
        let market_cancel = cancel.clone();
        tokio::spawn(async move { market.market_loop(market_cancel).await });

        let health = self.clone();
        let health_cancel = cancel.clone();
        tokio::spawn(async move { health.health_loop(health_cancel).await });

        let watch = self.clone();
        tokio::spawn(async move { watch.tx_watch_loop(cancel).await });

        info!(agent = %self.inner.config.agent_id, "guardian started");
    }

    async fn market_loop(self, cancel: CancellationToken) {
        loop {
            for pair in &self.inner.config.surveillance_pairs {
                self.analyze_pair(pair).await;
            }
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.inner.config.market_interval) => {}
            }
        }
    }

    async fn health_loop(self, cancel: CancellationToken) {
        loop {
            self.health_tick().await;
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.inner.config.health_interval) => {}
            }
        }
    }

    async fn tx_watch_loop(self, cancel: CancellationToken) {
        loop {
            self.tx_watch_tick();
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(self.inner.config.tx_watch_interval) => {}
            }
        }
    }

    /// Fetches a quote for one pair, records it, and raises alerts for
    /// any anomaly against the prior window.
    async fn analyze_pair(&self, pair: &str) {
        let Some((base, quote)) = pair.split_once('/') else {
            warn!(%pair, "malformed surveillance pair");
            return;
        };
        let quote_info = self.inner.chain.pair_info(base, quote).await;

        let window: Vec<PricePoint> = {
            let mut map = self
                .inner
                .price_history
                .lock()
                .expect("price history lock poisoned");
            let entries = map.entry(pair.to_string()).or_default();
            let window = entries.iter().copied().collect();
            if entries.len() == PRICE_HISTORY_CAP {
                entries.pop_front();
            }
            entries.push_back(PricePoint {
                price: quote_info.price,
                liquidity: quote_info.liquidity,
            });
            window
        };

        self.detect_and_alert(pair, &window, quote_info.price, quote_info.liquidity)
            .await;
    }

    async fn detect_and_alert(
        &self,
        pair: &str,
        window: &[PricePoint],
        price: f64,
        liquidity: f64,
    ) {
        if let Some(confidence) = anomaly::price_anomaly(window, price)
            && confidence > self.inner.config.alert_threshold
        {
            self.raise_flash_crash(pair, price, confidence).await;
        }
        if let Some(confidence) = anomaly::liquidity_anomaly(window, liquidity)
            && confidence > self.inner.config.alert_threshold
        {
            self.raise_liquidity_drop(pair, liquidity, confidence).await;
        }
    }

    async fn raise_flash_crash(&self, pair: &str, price: f64, confidence: f64) {
        let alert = SecurityAlert {
            id: format!("alert-{}", uuid::Uuid::new_v4().simple()),
            alert_type: "flash_crash".to_string(),
            severity: (confidence * 10.0) as i32,
            affected_pairs: vec![pair.to_string()],
            description: format!("Rapid price movement in {pair}: {price:.6}"),
            related_tx_hashes: Vec::new(),
        };
        warn!(%pair, price, confidence, "flash crash detected");
        self.publish_alert(alert).await;
    }

    async fn raise_liquidity_drop(&self, pair: &str, liquidity: f64, confidence: f64) {
        let alert = SecurityAlert {
            id: format!("alert-{}", uuid::Uuid::new_v4().simple()),
            alert_type: "liquidity_drop".to_string(),
            severity: (confidence * 8.0) as i32,
            affected_pairs: vec![pair.to_string()],
            description: format!("Liquidity drop in {pair}: {liquidity:.2}"),
            related_tx_hashes: Vec::new(),
        };
        warn!(%pair, liquidity, confidence, "liquidity drop detected");
        self.publish_alert(alert).await;
    }

    async fn publish_alert(&self, alert: SecurityAlert) {
        self.inner
            .alert_history
            .lock()
            .expect("alert history lock poisoned")
            .push(alert.clone());
        if self.client.connected() {
            self.client.broadcast_security_alert(alert).await;
        } else {
            warn!(id = %alert.id, "alert not broadcast, hub disconnected");
        }
    }

    async fn health_tick(&self) {
        let wallet = self
            .inner
            .chain
            .account_balance(&self.inner.config.wallet_address)
            .await;
        let gas_price = self.inner.chain.gas_price().await;
        info!(
            wallet = %self.inner.config.wallet_address,
            balance = wallet.balance,
            gas_gwei = gas_price as f64 / 1e9,
            "wallet health"
        );
        if rand::rng().random_bool(0.1) {
            info!("unusual wallet activity pattern, watching closely");
        }
    }

    /// Simulated mempool sweep. A real implementation would page through
    /// blocks with `eth_getBlockByNumber`.
    fn tx_watch_tick(&self) {
        let mut rng = rand::rng();
        if !rng.random_bool(0.15) {
            return;
        }
        let tx_hash = format!("0x{:016x}", rng.random::<u64>());
        let value: f64 = rng.random_range(1_000.0..100_000.0);
        info!(%tx_hash, value, "large transaction observed");
        if rng.random_bool(0.3) && !self.inner.config.surveillance_pairs.is_empty() {
            let idx = rng.random_range(0..self.inner.config.surveillance_pairs.len());
            let pair = &self.inner.config.surveillance_pairs[idx];
            warn!(%pair, "large transaction may impact surveillance pair");
        }
    }

    /// Runs the risk pipeline on one signal directly, outside the hub
    /// dispatch path.
    pub async fn analyze_trading_opportunity(&self, source: &str, signal: &TradeSignal) {
        self.inner.analyze_trading_opportunity(source, signal).await;
    }

    /// Alerts raised so far, oldest first.
    pub fn alert_history(&self) -> Vec<SecurityAlert> {
        self.inner
            .alert_history
            .lock()
            .expect("alert history lock poisoned")
            .clone()
    }

    /// Trades executed so far, oldest first.
    pub fn trade_history(&self) -> Vec<TradeRecord> {
        self.inner
            .trade_history
            .lock()
            .expect("trade history lock poisoned")
            .clone()
    }
}
