//! Multi-source price history feed: per (coin, timeframe) cache, provider
//! failover, and mock fallback.
//!
//! `get_history` is total from the caller's perspective. Every failure mode
//! (quota denial, transport error, malformed response) is absorbed and
//! converted into a degraded-but-valid series: stale cached data when any
//! exists, freshly generated mock data otherwise. Callers cannot distinguish
//! a mock series from a real one; both arrive as the same time/price list.

use crate::constants::{is_supported_coin, CACHE_TTL_MS, SUPPORTED_COINS};
use crate::error::Result;
use crate::models::{PricePoint, PriceSeries, Timeframe};
use crate::services::coingecko::CoinGeckoClient;
use crate::services::coinpaprika::CoinPaprikaClient;
use crate::services::mock_data;
use crate::services::rate_limiter::{Provider, RateLimiter};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// A provider adapter the feed can pull a history series from
#[async_trait]
pub trait HistorySource: Send + Sync {
    fn provider(&self) -> Provider;

    async fn fetch_history(&self, coin_id: &str, timeframe: Timeframe) -> Result<Vec<PricePoint>>;
}

/// Last successful series for one (coin, timeframe) pair
#[derive(Debug, Clone, Default)]
struct CacheEntry {
    prices: PriceSeries,
    /// Milliseconds since epoch of the last successful fetch; 0 = never
    last_fetch: i64,
}

/// Cache occupancy summary for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub populated_entries: usize,
}

/// Shared handle for passing the feed between the server and workers
pub type SharedPriceFeed = Arc<PriceFeed>;

/// Price history feed with an in-memory cache and two upstream providers.
///
/// All mutable state (cache table, rate limiter, preferred provider) lives
/// behind its own lock so concurrent requests and the broadcast worker can
/// share one instance. Concurrent refreshes of the same key are allowed and
/// resolve last-writer-wins; see DESIGN.md.
pub struct PriceFeed {
    sources: Vec<Box<dyn HistorySource>>,
    cache: RwLock<HashMap<(String, Timeframe), CacheEntry>>,
    limiter: Mutex<RateLimiter>,
    preferred: Mutex<Provider>,
}

impl PriceFeed {
    /// Build a feed backed by the real CoinGecko and CoinPaprika clients
    pub fn new() -> Result<Self> {
        Ok(Self::with_sources(vec![
            Box::new(CoinGeckoClient::new()?),
            Box::new(CoinPaprikaClient::new()?),
        ]))
    }

    /// Build a feed over arbitrary sources. Cache entries for every supported
    /// (coin, timeframe) pair are pre-created empty and live for the process
    /// lifetime.
    pub fn with_sources(sources: Vec<Box<dyn HistorySource>>) -> Self {
        let mut cache = HashMap::new();
        for coin in SUPPORTED_COINS {
            for timeframe in Timeframe::all() {
                cache.insert((coin.to_string(), timeframe), CacheEntry::default());
            }
        }

        Self {
            sources,
            cache: RwLock::new(cache),
            limiter: Mutex::new(RateLimiter::new()),
            preferred: Mutex::new(Provider::CoinGecko),
        }
    }

    /// Fetch a price history series. Never fails; the result may be cached,
    /// fresh, stale, or mock data depending on what is obtainable.
    pub async fn get_history(&self, coin_id: &str, days: &str) -> PriceSeries {
        let coin = coin_id.to_lowercase();

        // Unsupported (coin, timeframe) pairs bypass the cache entirely
        let Some(timeframe) = Timeframe::parse(days) else {
            debug!(coin = %coin, days = days, "Unsupported timeframe, serving mock data");
            return mock_data::generate_mock_history(&coin, days);
        };
        if !is_supported_coin(&coin) {
            debug!(coin = %coin, "Unsupported coin, serving mock data");
            return mock_data::generate_mock_history(&coin, timeframe.as_str());
        }

        let key = (coin.clone(), timeframe);
        let now = Utc::now().timestamp_millis();

        // Cache hit inside the freshness window
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&key) {
                if now - entry.last_fetch < CACHE_TTL_MS && !entry.prices.is_empty() {
                    debug!(coin = %coin, timeframe = %timeframe, "Cache hit");
                    return entry.prices.clone();
                }
            }
        }

        // Refresh: try whichever provider succeeded most recently first
        if let Some(prices) = self.fetch_from_providers(&coin, timeframe).await {
            let mut cache = self.cache.write().await;
            let entry = cache.entry(key).or_default();
            entry.prices = prices.clone();
            entry.last_fetch = Utc::now().timestamp_millis();
            return prices;
        }

        // Both providers failed: stale data beats mock data whenever any
        // real series exists. The stale entry keeps its old last_fetch so the
        // next call retries the providers.
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&key) {
                if !entry.prices.is_empty() {
                    warn!(coin = %coin, timeframe = %timeframe, "All providers failed, serving stale cache");
                    return entry.prices.clone();
                }
            }
        }

        warn!(coin = %coin, timeframe = %timeframe, "All providers failed with empty cache, serving mock data");
        mock_data::generate_mock_history(&coin, timeframe.as_str())
    }

    /// Try each source in preferred-first order, stopping at the first
    /// non-empty series.
    async fn fetch_from_providers(
        &self,
        coin: &str,
        timeframe: Timeframe,
    ) -> Option<Vec<PricePoint>> {
        let preferred = *self.preferred.lock().await;

        let mut order: Vec<&dyn HistorySource> =
            self.sources.iter().map(|s| s.as_ref()).collect();
        order.sort_by_key(|s| s.provider() != preferred);

        for source in order {
            if let Some(prices) = self.try_source(source, coin, timeframe).await {
                return Some(prices);
            }
        }

        None
    }

    async fn try_source(
        &self,
        source: &dyn HistorySource,
        coin: &str,
        timeframe: Timeframe,
    ) -> Option<Vec<PricePoint>> {
        let provider = source.provider();

        // Gate the attempt; attempts count against the quota even if the
        // request then fails.
        {
            let mut limiter = self.limiter.lock().await;
            if !limiter.can_call(provider) {
                debug!(provider = provider.name(), "Rate limit window full, skipping");
                return None;
            }
            limiter.record_call(provider);
        }

        match source.fetch_history(coin, timeframe).await {
            Ok(prices) if !prices.is_empty() => {
                *self.preferred.lock().await = provider;
                info!(
                    provider = provider.name(),
                    coin = coin,
                    timeframe = %timeframe,
                    points = prices.len(),
                    "Fetched price history"
                );
                Some(prices)
            }
            Ok(_) => {
                warn!(provider = provider.name(), coin = coin, "Provider returned empty series");
                None
            }
            Err(e) => {
                warn!(provider = provider.name(), coin = coin, error = %e, "Provider fetch failed");
                None
            }
        }
    }

    /// Provider that most recently produced a successful fetch
    pub async fn preferred_provider(&self) -> Provider {
        *self.preferred.lock().await
    }

    /// Cache occupancy, for the health endpoint
    pub async fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.read().await;
        CacheStats {
            total_entries: cache.len(),
            populated_entries: cache.values().filter(|e| !e.prices.is_empty()).count(),
        }
    }

    #[cfg(test)]
    async fn cache_entry(&self, coin: &str, timeframe: Timeframe) -> Option<CacheEntry> {
        self.cache
            .read()
            .await
            .get(&(coin.to_string(), timeframe))
            .cloned()
    }

    #[cfg(test)]
    async fn expire_entry(&self, coin: &str, timeframe: Timeframe) {
        if let Some(entry) = self
            .cache
            .write()
            .await
            .get_mut(&(coin.to_string(), timeframe))
        {
            entry.last_fetch = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    enum Outcome {
        Series(Vec<PricePoint>),
        Fail,
    }

    /// Scripted source: pops one outcome per call, fails once exhausted
    struct FakeSource {
        provider: Provider,
        outcomes: StdMutex<Vec<Outcome>>,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn new(provider: Provider, outcomes: Vec<Outcome>) -> Self {
            Self {
                provider,
                outcomes: StdMutex::new(outcomes),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl HistorySource for Arc<FakeSource> {
        fn provider(&self) -> Provider {
            self.provider
        }

        async fn fetch_history(
            &self,
            _coin_id: &str,
            _timeframe: Timeframe,
        ) -> Result<Vec<PricePoint>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut outcomes = self.outcomes.lock().unwrap();
            if outcomes.is_empty() {
                return Err(crate::error::Error::Network("scripted failure".into()));
            }
            match outcomes.remove(0) {
                Outcome::Series(prices) => Ok(prices),
                Outcome::Fail => Err(crate::error::Error::Network("scripted failure".into())),
            }
        }
    }

    fn sample_series(base: f64) -> Vec<PricePoint> {
        (0..10)
            .map(|i| PricePoint::new(1_700_000_000_000 + i * 60_000, base + i as f64))
            .collect()
    }

    fn feed_with(
        primary: Vec<Outcome>,
        secondary: Vec<Outcome>,
    ) -> (PriceFeed, Arc<FakeSource>, Arc<FakeSource>) {
        let gecko = Arc::new(FakeSource::new(Provider::CoinGecko, primary));
        let paprika = Arc::new(FakeSource::new(Provider::CoinPaprika, secondary));
        let feed = PriceFeed::with_sources(vec![
            Box::new(gecko.clone()),
            Box::new(paprika.clone()),
        ]);
        (feed, gecko, paprika)
    }

    #[tokio::test]
    async fn test_cold_cache_populates_from_primary() {
        let (feed, gecko, paprika) =
            feed_with(vec![Outcome::Series(sample_series(55_000.0))], vec![]);

        let before = Utc::now().timestamp_millis();
        let prices = feed.get_history("bitcoin", "7").await;

        assert_eq!(prices, sample_series(55_000.0));
        assert_eq!(gecko.call_count(), 1);
        assert_eq!(paprika.call_count(), 0);

        let entry = feed.cache_entry("bitcoin", Timeframe::Day7).await.unwrap();
        assert_eq!(entry.prices, prices);
        assert!(entry.last_fetch >= before);
        assert_eq!(feed.preferred_provider().await, Provider::CoinGecko);
    }

    #[tokio::test]
    async fn test_cache_hit_makes_no_outbound_calls() {
        let (feed, gecko, _) =
            feed_with(vec![Outcome::Series(sample_series(55_000.0))], vec![]);

        let first = feed.get_history("bitcoin", "1").await;
        let second = feed.get_history("bitcoin", "1").await;

        assert_eq!(first, second);
        assert_eq!(gecko.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failover_to_secondary_updates_preference() {
        let (feed, gecko, paprika) = feed_with(
            vec![Outcome::Fail, Outcome::Fail],
            vec![
                Outcome::Series(sample_series(54_000.0)),
                Outcome::Series(sample_series(54_500.0)),
            ],
        );

        let prices = feed.get_history("bitcoin", "1").await;
        assert_eq!(prices, sample_series(54_000.0));
        assert_eq!(gecko.call_count(), 1);
        assert_eq!(paprika.call_count(), 1);
        assert_eq!(feed.preferred_provider().await, Provider::CoinPaprika);

        // Next refresh should try the secondary first
        feed.expire_entry("bitcoin", Timeframe::Day1).await;
        let prices = feed.get_history("bitcoin", "1").await;
        assert_eq!(prices, sample_series(54_500.0));
        assert_eq!(paprika.call_count(), 2);
        // Primary never attempted on the second round
        assert_eq!(gecko.call_count(), 1);
    }

    #[tokio::test]
    async fn test_stale_cache_preferred_over_mock() {
        let (feed, _, _) = feed_with(
            vec![Outcome::Series(sample_series(55_000.0))],
            vec![],
        );

        let original = feed.get_history("ethereum", "30").await;
        feed.expire_entry("ethereum", Timeframe::Day30).await;

        // Both providers now fail; the stale series comes back unchanged
        let stale = feed.get_history("ethereum", "30").await;
        assert_eq!(stale, original);

        // last_fetch stays expired so the next call retries the providers
        let entry = feed.cache_entry("ethereum", Timeframe::Day30).await.unwrap();
        assert_eq!(entry.last_fetch, 0);
    }

    #[tokio::test]
    async fn test_total_failure_on_empty_cache_yields_mock() {
        let (feed, _, _) = feed_with(vec![], vec![]);

        let prices = feed.get_history("bitcoin", "1").await;

        assert_eq!(prices.len(), 50);
        for point in &prices {
            // Mock bitcoin: base 55k, 10% volatility for 1 day
            assert!(point.price >= 55_000.0 * 0.9 && point.price <= 55_000.0 * 1.1);
        }

        // Mock output is never cached
        let entry = feed.cache_entry("bitcoin", Timeframe::Day1).await.unwrap();
        assert!(entry.prices.is_empty());
        assert_eq!(entry.last_fetch, 0);
    }

    #[tokio::test]
    async fn test_unsupported_coin_bypasses_cache_and_providers() {
        let (feed, gecko, paprika) =
            feed_with(vec![Outcome::Series(sample_series(1.0))], vec![]);

        let prices = feed.get_history("shibainu", "1").await;

        assert_eq!(prices.len(), 50);
        assert_eq!(gecko.call_count(), 0);
        assert_eq!(paprika.call_count(), 0);
        assert!(feed.cache_entry("shibainu", Timeframe::Day1).await.is_none());
    }

    #[tokio::test]
    async fn test_coin_id_normalized_to_lowercase() {
        let (feed, gecko, _) =
            feed_with(vec![Outcome::Series(sample_series(55_000.0))], vec![]);

        let prices = feed.get_history("Bitcoin", "1").await;
        assert_eq!(prices, sample_series(55_000.0));
        assert_eq!(gecko.call_count(), 1);

        let entry = feed.cache_entry("bitcoin", Timeframe::Day1).await.unwrap();
        assert!(!entry.prices.is_empty());
    }

    #[tokio::test]
    async fn test_rate_limited_primary_skipped_without_fetch() {
        let outcomes: Vec<Outcome> = (0..20)
            .map(|_| Outcome::Series(sample_series(55_000.0)))
            .collect();
        let (feed, gecko, paprika) = feed_with(
            outcomes,
            vec![Outcome::Series(sample_series(54_000.0))],
        );

        // Exhaust the primary's 10-per-minute quota with distinct cold pairs
        let pairs: Vec<(&str, Timeframe)> = ["bitcoin", "ethereum", "solana"]
            .iter()
            .flat_map(|coin| Timeframe::all().into_iter().map(move |tf| (*coin, tf)))
            .take(10)
            .collect();
        for (coin, tf) in pairs {
            let _ = feed.get_history(coin, tf.as_str()).await;
        }
        assert_eq!(gecko.call_count(), 10);

        // 11th refresh falls through to the secondary without touching the
        // primary adapter
        let prices = feed.get_history("dogecoin", "1").await;
        assert_eq!(prices, sample_series(54_000.0));
        assert_eq!(gecko.call_count(), 10);
        assert_eq!(paprika.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_stats() {
        let (feed, _, _) =
            feed_with(vec![Outcome::Series(sample_series(55_000.0))], vec![]);

        let stats = feed.cache_stats().await;
        assert_eq!(stats.total_entries, 20); // 5 coins x 4 timeframes
        assert_eq!(stats.populated_entries, 0);

        let _ = feed.get_history("bitcoin", "1").await;
        let stats = feed.cache_stats().await;
        assert_eq!(stats.populated_entries, 1);
    }
}
