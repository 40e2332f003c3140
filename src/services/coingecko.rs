//! CoinGecko API client (primary provider)
//!
//! Fetches a true historical price series via the `market_chart` endpoint
//! (https://api.coingecko.com/api/v3). Response entries are `[time_ms, price]`
//! pairs and translate directly into [`PricePoint`]s.

use crate::error::{Error, Result};
use crate::models::{PricePoint, Timeframe};
use crate::services::price_feed::HistorySource;
use crate::services::rate_limiter::Provider;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Base URL for the CoinGecko v3 API
const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Request timeout for market chart calls
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct MarketChartResponse {
    prices: Vec<(i64, f64)>,
}

/// CoinGecko market chart client
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Fetch the USD market chart for a coin over the given span
    async fn market_chart(&self, coin_id: &str, timeframe: Timeframe) -> Result<Vec<PricePoint>> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, coin_id);

        debug!(coin = coin_id, days = timeframe.as_str(), "Fetching CoinGecko market chart");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("vs_currency", "usd"),
                ("days", timeframe.as_str()),
                ("precision", "full"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!(
                "CoinGecko returned HTTP {} for {}",
                status, coin_id
            )));
        }

        let chart: MarketChartResponse = response.json().await?;

        let prices: Vec<PricePoint> = chart
            .prices
            .into_iter()
            .map(|(time, price)| PricePoint::new(time, price))
            .collect();

        if prices.is_empty() {
            return Err(Error::Parse(format!("CoinGecko returned no prices for {}", coin_id)));
        }

        Ok(prices)
    }
}

#[async_trait]
impl HistorySource for CoinGeckoClient {
    fn provider(&self) -> Provider {
        Provider::CoinGecko
    }

    async fn fetch_history(&self, coin_id: &str, timeframe: Timeframe) -> Result<Vec<PricePoint>> {
        self.market_chart(coin_id, timeframe).await
    }
}
