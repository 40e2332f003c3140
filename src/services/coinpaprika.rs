//! CoinPaprika API client (secondary provider)
//!
//! CoinPaprika's ticker endpoint only exposes a current price snapshot, not a
//! history. The adapter synthesizes a plausible series from that single
//! reading: evenly spaced timestamps across the requested span and a
//! multiplicative random walk with a small per-step drift. The result is
//! illustrative chart data, not a reconstruction of real history.

use crate::constants::SYNTHETIC_MAX_POINTS;
use crate::error::{Error, Result};
use crate::models::{PricePoint, Timeframe};
use crate::services::price_feed::HistorySource;
use crate::services::rate_limiter::Provider;
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Base URL for the CoinPaprika v1 API
const BASE_URL: &str = "https://api.coinpaprika.com/v1";

/// Request timeout for ticker calls
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Per-step drift bound for the synthetic walk (±0.5%)
const DRIFT_BOUND: f64 = 0.005;

/// CoinPaprika uses its own `{symbol}-{name}` identifiers. Unmapped coin ids
/// pass through unchanged.
fn paprika_id(coin_id: &str) -> &str {
    match coin_id {
        "bitcoin" => "btc-bitcoin",
        "ethereum" => "eth-ethereum",
        "solana" => "sol-solana",
        "ripple" => "xrp-xrp",
        "dogecoin" => "doge-dogecoin",
        other => other,
    }
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    quotes: Quotes,
}

#[derive(Debug, Deserialize)]
struct Quotes {
    #[serde(rename = "USD")]
    usd: UsdQuote,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    price: f64,
}

/// CoinPaprika ticker client
pub struct CoinPaprikaClient {
    client: Client,
    base_url: String,
}

impl CoinPaprikaClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Fetch the current USD price for a coin
    async fn current_price(&self, coin_id: &str) -> Result<f64> {
        let mapped_id = paprika_id(coin_id);
        let url = format!("{}/tickers/{}", self.base_url, mapped_id);

        debug!(coin = coin_id, mapped = mapped_id, "Fetching CoinPaprika ticker");

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!(
                "CoinPaprika returned HTTP {} for {}",
                status, mapped_id
            )));
        }

        let ticker: TickerResponse = response.json().await?;
        Ok(ticker.quotes.usd.price)
    }
}

/// Build a synthetic series from a single price reading.
///
/// Point count is `min(days * 24, 100)`, timestamps evenly spaced across the
/// span ending at `now_ms`. Prices follow a multiplicative random walk from
/// the snapshot, one drift step per point, even though the series runs
/// "backward" in time from the reading.
pub fn synthesize_history(price: f64, timeframe: Timeframe, now_ms: i64) -> Vec<PricePoint> {
    let span_ms = timeframe.span_ms();
    let start_ms = now_ms - span_ms;
    let point_count = (timeframe.days() * 24).min(SYNTHETIC_MAX_POINTS);
    let step_ms = span_ms / point_count as i64;

    let mut rng = rand::thread_rng();
    let mut series = Vec::with_capacity(point_count as usize);
    let mut last_price = price;

    for i in 0..point_count as i64 {
        let drift = rng.gen_range(-DRIFT_BOUND..DRIFT_BOUND);
        last_price *= 1.0 + drift;
        series.push(PricePoint::new(start_ms + i * step_ms, last_price));
    }

    series
}

#[async_trait]
impl HistorySource for CoinPaprikaClient {
    fn provider(&self) -> Provider {
        Provider::CoinPaprika
    }

    async fn fetch_history(&self, coin_id: &str, timeframe: Timeframe) -> Result<Vec<PricePoint>> {
        let price = self.current_price(coin_id).await?;
        Ok(synthesize_history(price, timeframe, Utc::now().timestamp_millis()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paprika_id_mapping() {
        assert_eq!(paprika_id("bitcoin"), "btc-bitcoin");
        assert_eq!(paprika_id("ripple"), "xrp-xrp");
        // Unmapped ids pass through
        assert_eq!(paprika_id("shibainu"), "shibainu");
    }

    #[test]
    fn test_parse_ticker_response() {
        let body = r#"{
            "id": "btc-bitcoin",
            "name": "Bitcoin",
            "symbol": "BTC",
            "quotes": { "USD": { "price": 55123.75, "volume_24h": 1.0 } }
        }"#;

        let ticker: TickerResponse = serde_json::from_str(body).unwrap();
        assert_eq!(ticker.quotes.usd.price, 55123.75);
    }

    #[test]
    fn test_synthetic_point_count_caps_at_100() {
        let now = 1_700_000_000_000;
        // 1 day -> 24 points
        assert_eq!(synthesize_history(100.0, Timeframe::Day1, now).len(), 24);
        // 7 days would be 168, capped at 100
        assert_eq!(synthesize_history(100.0, Timeframe::Day7, now).len(), 100);
        assert_eq!(synthesize_history(100.0, Timeframe::Day90, now).len(), 100);
    }

    #[test]
    fn test_synthetic_timestamps_evenly_spaced() {
        let now = 1_700_000_000_000;
        let series = synthesize_history(55_000.0, Timeframe::Day1, now);

        let span = Timeframe::Day1.span_ms();
        let step = span / series.len() as i64;

        assert_eq!(series[0].time, now - span);
        for pair in series.windows(2) {
            assert_eq!(pair[1].time - pair[0].time, step);
        }
        // Last point lands one step short of now
        assert_eq!(series.last().unwrap().time, now - span + (series.len() as i64 - 1) * step);
    }

    #[test]
    fn test_synthetic_walk_stays_near_snapshot() {
        let now = 1_700_000_000_000;
        let series = synthesize_history(1_000.0, Timeframe::Day7, now);

        // 100 steps of at most ±0.5% each keeps the walk well inside ±65%
        for point in &series {
            assert!(point.price > 350.0 && point.price < 1_650.0);
            assert!(point.price > 0.0);
        }
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_bitcoin_snapshot() {
        let client = CoinPaprikaClient::new().unwrap();
        let prices = client
            .fetch_history("bitcoin", Timeframe::Day1)
            .await
            .unwrap();

        assert_eq!(prices.len(), 24);
    }
}
