//! Sliding-window rate limiting for upstream price providers.
//!
//! Each provider has a fixed per-minute quota. The limiter keeps the raw
//! timestamps of recent calls and prunes anything older than the window on
//! every admission check. It never blocks or queues; callers check before
//! attempting a request and record the attempt themselves.

use crate::constants::RATE_LIMIT_WINDOW_MS;
use chrono::Utc;
use std::collections::HashMap;

/// Upstream price data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    /// Primary source, serves true historical series
    CoinGecko,
    /// Secondary source, serves only a current-price snapshot
    CoinPaprika,
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Provider::CoinGecko => "coingecko",
            Provider::CoinPaprika => "coinpaprika",
        }
    }

    /// Free-tier call quota per sliding minute
    pub fn calls_per_minute(&self) -> usize {
        match self {
            Provider::CoinGecko => 10,
            Provider::CoinPaprika => 5,
        }
    }

}

/// Tracks recent call timestamps per provider
#[derive(Debug, Default)]
pub struct RateLimiter {
    call_times: HashMap<Provider, Vec<i64>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when `provider` still has quota left in the current
    /// 60-second window. Prunes expired timestamps as a side effect.
    pub fn can_call(&mut self, provider: Provider) -> bool {
        self.can_call_at(provider, Utc::now().timestamp_millis())
    }

    /// Records an attempted call. Attempts count against the quota whether or
    /// not the request later succeeds.
    pub fn record_call(&mut self, provider: Provider) {
        self.record_call_at(provider, Utc::now().timestamp_millis());
    }

    fn can_call_at(&mut self, provider: Provider, now_ms: i64) -> bool {
        let times = self.call_times.entry(provider).or_default();
        times.retain(|&t| now_ms - t < RATE_LIMIT_WINDOW_MS);
        times.len() < provider.calls_per_minute()
    }

    fn record_call_at(&mut self, provider: Provider, now_ms: i64) {
        self.call_times.entry(provider).or_default().push(now_ms);
    }
}
