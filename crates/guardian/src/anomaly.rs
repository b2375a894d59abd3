//! Threshold-based anomaly checks.
//!
//! Simple numeric comparisons against a short rolling window; not a
//! model. Both detectors return a confidence in `[0, 1]` when the move
//! exceeds the trip threshold, and `None` otherwise.

/// One market observation for a pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub price: f64,
    pub liquidity: f64,
}

/// Rolling window kept per surveillance pair.
pub const PRICE_HISTORY_CAP: usize = 50;

/// Minimum observations before either detector arms.
const MIN_SAMPLES: usize = 5;

/// Fires when the current price deviates more than 5% from the mean of
/// the last five observations. Confidence scales with the deviation.
pub fn price_anomaly(history: &[PricePoint], current_price: f64) -> Option<f64> {
    if history.len() < MIN_SAMPLES {
        return None;
    }
    let window = &history[history.len() - MIN_SAMPLES..];
    let mean: f64 = window.iter().map(|p| p.price).sum::<f64>() / window.len() as f64;
    if mean <= 0.0 {
        return None;
    }
    let change = (current_price - mean).abs() / mean;
    if change > 0.05 {
        Some((change * 20.0).min(1.0))
    } else {
        None
    }
}

/// Fires when current liquidity sits more than 20% below the mean of the
/// last five observations.
pub fn liquidity_anomaly(history: &[PricePoint], current_liquidity: f64) -> Option<f64> {
    if history.len() < MIN_SAMPLES {
        return None;
    }
    let window = &history[history.len() - MIN_SAMPLES..];
    let mean: f64 = window.iter().map(|p| p.liquidity).sum::<f64>() / window.len() as f64;
    if mean <= 0.0 {
        return None;
    }
    let drop = (mean - current_liquidity) / mean;
    if drop > 0.2 {
        Some((drop * 5.0).min(1.0))
    } else {
        None
    }
}
