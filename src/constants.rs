//! Process-wide constants for the price feed.
//!
//! The supported coin set and timeframe set are fixed: every (coin, timeframe)
//! pair outside the cross product bypasses the cache and is served mock data.

/// Coins tracked by the cache and the periodic broadcast.
pub const SUPPORTED_COINS: &[&str] = &["bitcoin", "ethereum", "solana", "ripple", "dogecoin"];

/// Freshness window for cached history (10 minutes).
pub const CACHE_TTL_MS: i64 = 600_000;

/// Interval between broadcast cycles (3 minutes).
pub const BROADCAST_INTERVAL_SECS: u64 = 180;

/// Sliding window used for provider rate limiting.
pub const RATE_LIMIT_WINDOW_MS: i64 = 60_000;

/// Number of points in a generated mock series.
pub const MOCK_POINT_COUNT: usize = 50;

/// Upper bound on points in a synthesized (snapshot-derived) series.
pub const SYNTHETIC_MAX_POINTS: u32 = 100;

pub fn is_supported_coin(coin_id: &str) -> bool {
    SUPPORTED_COINS.contains(&coin_id)
}
