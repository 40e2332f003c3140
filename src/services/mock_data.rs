//! Synthetic fallback data for when no real price history is obtainable.
//!
//! Mock series are independent uniform noise around a fixed per-coin base
//! price (unlike the snapshot synthesis in the CoinPaprika adapter, which is a
//! random walk). They are a degraded-mode placeholder, not market data.

use crate::constants::MOCK_POINT_COUNT;
use crate::models::{PricePoint, Timeframe};
use chrono::Utc;
use rand::Rng;

/// Default base price for coins without a table entry
const DEFAULT_BASE_PRICE: f64 = 100.0;

/// Default volatility when the timeframe is not in the fixed set
const DEFAULT_VOLATILITY: f64 = 0.1;

/// Rough reference price per supported coin
fn base_price(coin_id: &str) -> f64 {
    match coin_id {
        "bitcoin" => 55_000.0,
        "ethereum" => 3_000.0,
        "solana" => 100.0,
        "ripple" => 0.5,
        "dogecoin" => 0.1,
        _ => DEFAULT_BASE_PRICE,
    }
}

/// Generate a 50-point mock series spanning `days` days ending now.
///
/// Never fails and never returns an empty series; arbitrary coin ids and
/// unparseable day strings fall back to table defaults.
pub fn generate_mock_history(coin_id: &str, days: &str) -> Vec<PricePoint> {
    generate_mock_history_at(coin_id, days, Utc::now().timestamp_millis())
}

fn generate_mock_history_at(coin_id: &str, days: &str, now_ms: i64) -> Vec<PricePoint> {
    let base = base_price(coin_id);
    let volatility = Timeframe::parse(days)
        .map(|tf| tf.volatility())
        .unwrap_or(DEFAULT_VOLATILITY);

    let day_count = days.trim().parse::<u32>().unwrap_or(1).max(1);
    let span_ms = day_count as i64 * 24 * 60 * 60 * 1000;
    let start_ms = now_ms - span_ms;

    let mut rng = rand::thread_rng();
    let mut series = Vec::with_capacity(MOCK_POINT_COUNT);

    for i in 0..MOCK_POINT_COUNT {
        let time = start_ms + (i as i64 * span_ms) / MOCK_POINT_COUNT as i64;
        let variation = rng.gen_range(-volatility..volatility);
        series.push(PricePoint::new(time, base * (1.0 + variation)));
    }

    series
}
